//! Find a live peer to join the ring through.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chordring_core::dht::Id;
use chordring_core::transport::Transport;

/// Produces one reachable peer to join through, or `None` to start a new ring.
#[async_trait]
pub trait Discovery {
    async fn bootstrap(&self) -> Option<Id>;
}

/// Rounds of probing repeated while a smaller peer is up but has not joined yet.
pub const DEFAULT_PROBE_RETRIES: usize = 10;
/// Pause between two rounds of probing.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Probe a static list of peers with `findSuccessor`, in ascending id order.
/// A peer that is up but has not joined a ring answers with an error and is skipped.
/// When nodes start together the smallest live id creates the ring and the others wait
/// for it, so a node with a smaller unjoined peer probes again before giving up.
pub struct StaticDiscovery {
    id: Id,
    peers: Vec<Id>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    retries: usize,
    interval: Duration,
}

impl StaticDiscovery {
    pub fn new(id: Id, peers: Vec<Id>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        let mut peers = peers;
        peers.sort();
        peers.dedup();
        Self {
            id,
            peers,
            transport,
            timeout,
            retries: DEFAULT_PROBE_RETRIES,
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Override how often and how long to wait for a smaller peer to join.
    pub fn with_retry(mut self, retries: usize, interval: Duration) -> Self {
        self.retries = retries;
        self.interval = interval;
        self
    }

    /// One pass over the table. Returns the first joined peer, and whether a smaller
    /// peer answered without having joined.
    async fn probe_once(&self) -> (Option<Id>, bool) {
        let mut waiting = false;
        for peer in self.peers.iter().filter(|p| **p != self.id) {
            let probe = tokio::time::timeout(
                self.timeout,
                self.transport.find_successor(*peer, self.id),
            );
            match probe.await {
                Ok(Ok(_)) => return (Some(*peer), waiting),
                Ok(Err(e)) if !e.is_unreachable() => {
                    tracing::debug!("peer {} is up but not in a ring: {}", peer, e);
                    waiting |= *peer < self.id;
                }
                Ok(Err(e)) => tracing::debug!("peer {} did not answer: {}", peer, e),
                Err(_) => tracing::debug!("peer {} timed out", peer),
            }
        }
        (None, waiting)
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn bootstrap(&self) -> Option<Id> {
        for round in 0..=self.retries {
            match self.probe_once().await {
                (Some(peer), _) => {
                    tracing::info!("bootstrap through peer {}", peer);
                    return Some(peer);
                }
                (None, true) if round < self.retries => {
                    tracing::info!("waiting for a smaller peer to create the ring");
                    tokio::time::sleep(self.interval).await;
                }
                (None, _) => break,
            }
        }
        tracing::info!("no peer in a ring answered, starting a new ring");
        None
    }
}

/// Join through a fixed peer, if any.
pub struct FixedDiscovery(pub Option<Id>);

#[async_trait]
impl Discovery for FixedDiscovery {
    async fn bootstrap(&self) -> Option<Id> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chordring_core::error::Error;
    use chordring_core::error::Result;

    use super::*;

    /// Only `alive` peers answer, `unjoined` ones answer lookups with an error.
    /// Records every probe.
    struct Probe {
        alive: HashSet<Id>,
        unjoined: HashSet<Id>,
        probed: Mutex<Vec<Id>>,
    }

    impl Probe {
        fn new(alive: &[u64]) -> Arc<Self> {
            Self::with_unjoined(alive, &[])
        }

        fn with_unjoined(alive: &[u64], unjoined: &[u64]) -> Arc<Self> {
            Arc::new(Self {
                alive: alive.iter().map(|x| Id::new(*x)).collect(),
                unjoined: unjoined.iter().map(|x| Id::new(*x)).collect(),
                probed: Mutex::new(vec![]),
            })
        }

        fn check(&self, target: Id) -> Result<()> {
            self.probed.lock().unwrap().push(target);
            if self.alive.contains(&target) {
                Ok(())
            } else {
                Err(Error::PeerUnreachable(target))
            }
        }
    }

    #[async_trait]
    impl Transport for Probe {
        async fn find_successor(&self, target: Id, _key: Id) -> Result<Id> {
            self.check(target)?;
            if self.unjoined.contains(&target) {
                return Err(Error::RemoteCall {
                    target,
                    reason: "Node has not joined a ring yet".to_string(),
                });
            }
            Ok(target)
        }
        async fn get_predecessor(&self, target: Id) -> Result<Option<Id>> {
            self.check(target).map(|_| None)
        }
        async fn set_predecessor(&self, target: Id, _: Option<Id>) -> Result<()> {
            self.check(target)
        }
        async fn set_successor(&self, target: Id, _: Id) -> Result<()> {
            self.check(target)
        }
        async fn notify(&self, target: Id, _: Id) -> Result<()> {
            self.check(target)
        }
        async fn update_finger_table(&self, target: Id, _: Id, _: usize) -> Result<()> {
            self.check(target)
        }
        async fn get_information(&self, target: Id, _: Id) -> Result<Option<String>> {
            self.check(target).map(|_| None)
        }
        async fn add_information(&self, target: Id, _: Id, _: String) -> Result<()> {
            self.check(target)
        }
        async fn remove_information(&self, target: Id, _: Id) -> Result<()> {
            self.check(target)
        }
    }

    fn ids(v: &[u64]) -> Vec<Id> {
        v.iter().map(|x| Id::new(*x)).collect()
    }

    #[tokio::test]
    async fn test_first_live_peer_in_id_order() {
        let probe = Probe::new(&[21, 12]);
        let discovery = StaticDiscovery::new(
            Id::new(3),
            ids(&[21, 3, 7, 12]),
            probe.clone(),
            Duration::from_millis(100),
        );
        assert_eq!(discovery.bootstrap().await, Some(Id::new(12)));
        // self is never probed
        assert_eq!(*probe.probed.lock().unwrap(), ids(&[7, 12]));
    }

    #[tokio::test]
    async fn test_no_live_peer_starts_a_ring() {
        let probe = Probe::new(&[3]);
        let discovery = StaticDiscovery::new(
            Id::new(3),
            ids(&[3, 7]),
            probe,
            Duration::from_millis(100),
        );
        assert_eq!(discovery.bootstrap().await, None);
        assert_eq!(FixedDiscovery(Some(Id::new(7))).bootstrap().await, Some(Id::new(7)));
    }

    #[tokio::test]
    async fn test_skip_peer_that_has_not_joined() {
        // 7 is up but still waiting to join, 12 is part of a ring
        let probe = Probe::with_unjoined(&[7, 12], &[7]);
        let discovery = StaticDiscovery::new(
            Id::new(3),
            ids(&[7, 12]),
            probe.clone(),
            Duration::from_millis(100),
        );
        assert_eq!(discovery.bootstrap().await, Some(Id::new(12)));
        assert_eq!(*probe.probed.lock().unwrap(), ids(&[7, 12]));
    }

    #[tokio::test]
    async fn test_wait_for_smaller_peer_to_create_the_ring() {
        let probe = Probe::with_unjoined(&[7], &[7]);
        let discovery = StaticDiscovery::new(
            Id::new(12),
            ids(&[7, 12]),
            probe.clone(),
            Duration::from_millis(100),
        )
        .with_retry(2, Duration::from_millis(10));
        assert_eq!(discovery.bootstrap().await, None);
        assert_eq!(*probe.probed.lock().unwrap(), ids(&[7, 7, 7]));
    }
}
