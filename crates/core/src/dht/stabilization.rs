//! Stabilization run daemons to maintain dht.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::chord::PeerRing;
use super::id::Id;
use crate::dht::Chord;
use crate::error::Result;

impl PeerRing {
    /// Drop `dead` from the local view. A dead successor is replaced by the first finger
    /// that still answers, or by this node itself when none does.
    pub async fn handle_dead_node(&self, dead: Id) -> Result<()> {
        let lost_successor = {
            let mut state = self.lock_state()?;
            if state.predecessor == Some(dead) {
                tracing::info!("[{}] predecessor {} is dead", self.id, dead);
                state.predecessor = None;
            }
            state.finger.remove(dead);
            state.successor == Some(dead)
        };
        if lost_successor {
            let successor = self.find_alive_successor().await?;
            tracing::info!(
                "[{}] successor {} is dead, replaced by {}",
                self.id,
                dead,
                successor
            );
            self.lock_state()?.set_successor(successor);
        }
        Ok(())
    }

    /// Probe finger entries in order. Entries that do not answer are cleared.
    pub(crate) async fn find_alive_successor(&self) -> Result<Id> {
        let candidates = self.lock_state()?.finger.peers();
        for candidate in candidates {
            let probe = tokio::time::timeout(
                self.rpc_timeout,
                self.transport.get_predecessor(candidate),
            )
            .await;
            match probe {
                Ok(Ok(_)) => return Ok(candidate),
                Ok(Err(e)) if !e.is_unreachable() => return Ok(candidate),
                _ => {
                    tracing::debug!("[{}] finger {} did not answer", self.id, candidate);
                    self.lock_state()?.finger.remove(candidate);
                }
            }
        }
        Ok(self.id)
    }
}

/// The stabilization runner.
#[derive(Clone)]
pub struct Stabilizer {
    dht: Arc<PeerRing>,
}

impl Stabilizer {
    /// Create a new stabilization runner.
    pub fn new(dht: Arc<PeerRing>) -> Self {
        Self { dht }
    }

    /// Run stabilization once.
    pub async fn stabilize(&self) -> Result<()> {
        tracing::debug!("STABILIZATION stabilize start");
        if let Err(e) = self.dht.stabilize().await {
            tracing::error!("[stabilize] Failed on stabilize {:?}", e);
        }
        tracing::debug!("STABILIZATION stabilize end");
        tracing::debug!("STABILIZATION fix_fingers start");
        if let Err(e) = self.dht.fix_fingers().await {
            tracing::error!("[stabilize] Failed on fix_finger {:?}", e);
        }
        tracing::debug!("STABILIZATION fix_fingers end");
        Ok(())
    }

    /// Run stabilization every `interval` until `cancel` fires.
    /// The full interval is slept after every pass.
    pub async fn wait(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.stabilize().await {
                tracing::error!("[stabilize] Failed on call stabilize {:?}", e);
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::info!("[{}] stabilization stopped", self.dht.id);
    }
}
