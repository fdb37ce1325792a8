//! Building the local view on join and tearing down the neighbours' view on leave.

use super::chord::PeerRing;
use super::id::in_range;
use super::id::Bound;
use super::id::Id;
use super::types::Chord;
use crate::error::Result;

impl PeerRing {
    /// Ask `bootstrap` for our successor, take over its predecessor, and fill the rest of
    /// the finger table, reusing the previous entry wherever it already covers the start.
    pub(crate) async fn init_finger_table(&self, bootstrap: Id) -> Result<()> {
        let successor = self
            .rpc_find_successor(bootstrap, self.space.start(self.id, 0))
            .await?;
        self.lock_state()?.set_successor(successor);

        let predecessor = self.rpc_get_predecessor(successor).await?;
        self.lock_state()?.predecessor = predecessor;
        self.rpc_set_predecessor(successor, Some(self.id)).await?;

        for i in 0..(self.space.bits() as usize - 1) {
            let start = self.space.start(self.id, i + 1);
            let prev = self.lock_state()?.finger[i];
            let entry = match prev {
                Some(f) if in_range(start, self.id, f, Bound::Open) => f,
                _ => self.find_successor(start).await?,
            };
            self.lock_state()?.set_finger(i + 1, entry);
        }

        if let Some(p) = predecessor {
            self.rpc_notify(p, self.id).await?;
        }
        Ok(())
    }

    /// Every node whose finger `i` should now point here precedes `id - 2^i`.
    /// Failures are logged, `fix_fingers` repairs what is missed.
    pub(crate) async fn update_others(&self) {
        for i in 0..self.space.bits() as usize {
            let target = self.space.back(self.id, i);
            let p = match self.find_predecessor(target).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("[update_others] Failed on find predecessor of {}: {:?}", target, e);
                    continue;
                }
            };
            if let Err(e) = self.rpc_update_finger_table(p, self.id, i).await {
                tracing::error!("[update_others] Failed on update finger {} of {}: {:?}", i, p, e);
            }
        }
    }

    /// Move every owned pair to `successor`.
    pub(crate) async fn hand_over(&self, successor: Id) -> Result<()> {
        let items = self.storage.list().await?;
        tracing::info!("[{}] handing {} keys to {}", self.id, items.len(), successor);
        for (key, value) in items {
            self.rpc_add_information(successor, key, &value).await?;
        }
        Ok(())
    }

    /// Point the two neighbours at each other and let them notify immediately.
    /// When this node is its own successor the predecessor is left as a ring of one.
    /// Best effort, the next stabilize pass fixes anything missed here.
    pub(crate) async fn splice(&self, predecessor: Option<Id>, successor: Id) {
        if successor == self.id {
            if let Some(p) = predecessor {
                if let Err(e) = self.rpc_set_successor(p, p).await {
                    tracing::warn!("[leave] Failed on set successor of {}: {:?}", p, e);
                }
            }
            return;
        }

        if let Some(p) = predecessor {
            if let Err(e) = self.rpc_set_successor(p, successor).await {
                tracing::warn!("[leave] Failed on set successor of {}: {:?}", p, e);
            }
        }
        if let Err(e) = self.rpc_set_predecessor(successor, predecessor).await {
            tracing::warn!("[leave] Failed on set predecessor of {}: {:?}", successor, e);
        }
        if let Some(p) = predecessor {
            if let Err(e) = self.rpc_notify(p, successor).await {
                tracing::warn!("[leave] Failed on notify {}: {:?}", p, e);
            }
            if let Err(e) = self.rpc_notify(successor, p).await {
                tracing::warn!("[leave] Failed on notify {}: {:?}", successor, e);
            }
        }
    }
}
