//! Chord algorithm implement.
#![warn(missing_docs)]
use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use super::id::in_range;
use super::id::Bound;
use super::id::Id;
use super::id::IdSpace;
use super::types::Chord;
use super::types::ChordStorage;
use super::FingerTable;
use crate::consts::DEFAULT_RPC_TIMEOUT_MS;
use crate::error::Error;
use crate::error::Result;
use crate::storage::InformationStore;
use crate::transport::Transport;

/// Parameters a [PeerRing] is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    /// Position of the node on the ring.
    pub id: Id,
    /// `m`, shared by every node of the ring.
    pub id_bits: u8,
    /// Upper bound of every single remote call.
    pub rpc_timeout: Duration,
}

impl NodeConfig {
    /// Config with the default rpc timeout.
    pub fn new(id: impl Into<Id>, id_bits: u8) -> Self {
        Self {
            id: id.into(),
            id_bits,
            rpc_timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
        }
    }

    /// Override the rpc timeout.
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }
}

/// What a node knows about the ring. Guarded by one mutex per node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingState {
    /// The next node on the ring. `None` only before join.
    pub successor: Option<Id>,
    /// The previous node on the ring. `None` means unknown.
    pub predecessor: Option<Id>,
    /// [FingerTable] help node to find successor quickly.
    /// Its first entry always equals `successor`.
    pub finger: FingerTable,
}

impl RingState {
    fn new(id: Id, space: IdSpace) -> Self {
        Self {
            successor: None,
            predecessor: None,
            finger: FingerTable::new(id, space),
        }
    }

    /// Set the successor and the first finger together.
    pub fn set_successor(&mut self, successor: Id) {
        self.successor = Some(successor);
        self.finger.set(0, successor);
    }

    /// Set finger `i`, keeping the successor in sync when `i` is 0.
    pub fn set_finger(&mut self, i: usize, id: Id) {
        self.finger.set(i, id);
        if i == 0 {
            self.successor = Some(id);
        }
    }
}

/// Counters for diagnostics, they play no role in routing.
#[derive(Debug, Default)]
pub struct NodeStats {
    pub(crate) lookups: AtomicU64,
    pub(crate) stabilizations: AtomicU64,
    pub(crate) finger_fixes: AtomicU64,
    pub(crate) join_time: Mutex<Option<DateTime<Utc>>>,
}

impl NodeStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// PeerRing is used to help a node interact with other nodes.
/// All nodes in the network form a clockwise ring in the order of [Id].
/// This struct takes its name from that.
/// PeerRing implemented [Chord] algorithm.
/// PeerRing implemented [ChordStorage] protocol.
pub struct PeerRing {
    /// The id of current node.
    pub id: Id,
    /// Identifier space of the ring.
    pub space: IdSpace,
    state: Mutex<RingState>,
    /// Local storage for [ChordStorage].
    pub storage: InformationStore,
    pub(crate) stats: NodeStats,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) rpc_timeout: Duration,
}

impl PeerRing {
    /// Create a node that has not joined any ring yet.
    pub fn new(config: NodeConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let space = IdSpace::new(config.id_bits)?;
        let id = space.id(config.id.value())?;
        Ok(Self {
            id,
            space,
            state: Mutex::new(RingState::new(id, space)),
            storage: InformationStore::default(),
            stats: NodeStats::default(),
            transport,
            rpc_timeout: config.rpc_timeout,
        })
    }

    /// Reject an id that is not a position of this ring. Keys and node ids coming from
    /// outside are wrapped in [Id] without a range check.
    pub fn check_id(&self, id: Id) -> Result<Id> {
        if !self.space.contains(id) {
            return Err(Error::IdOutOfRange(id.value(), self.space.bits()));
        }
        Ok(id)
    }

    /// Lock and return MutexGuard of ring state.
    pub fn lock_state(&self) -> Result<MutexGuard<RingState>> {
        self.state.lock().map_err(|_| Error::DHTSyncLockError)
    }

    /// Copy of the current ring state.
    pub fn state(&self) -> Result<RingState> {
        Ok(self.lock_state()?.clone())
    }

    /// Current successor.
    pub fn successor(&self) -> Result<Option<Id>> {
        Ok(self.lock_state()?.successor)
    }

    /// Current predecessor.
    pub fn predecessor(&self) -> Result<Option<Id>> {
        Ok(self.lock_state()?.predecessor)
    }

    /// Overwrite the successor, as asked by a leaving neighbour.
    pub fn set_successor(&self, successor: Id) -> Result<()> {
        self.check_id(successor)?;
        tracing::debug!("[{}] set successor to {}", self.id, successor);
        self.lock_state()?.set_successor(successor);
        Ok(())
    }

    /// Overwrite the predecessor, as asked by a joining or leaving neighbour.
    pub fn set_predecessor(&self, predecessor: Option<Id>) -> Result<()> {
        if let Some(p) = predecessor {
            self.check_id(p)?;
        }
        tracing::debug!("[{}] set predecessor to {:?}", self.id, predecessor);
        self.lock_state()?.predecessor = predecessor;
        Ok(())
    }

    /// Has this node joined a ring.
    pub fn is_joined(&self) -> Result<bool> {
        Ok(self.successor()?.is_some())
    }

    /// Read `key` from the local store only.
    pub async fn local_information(&self, key: Id) -> Result<Option<String>> {
        self.check_id(key)?;
        self.storage.get(key).await
    }

    /// Write `key` into the local store only.
    pub async fn add_information(&self, key: Id, value: &str) -> Result<()> {
        self.check_id(key)?;
        tracing::debug!("[{}] store information {}", self.id, key);
        self.storage.put(key, value).await
    }

    /// Delete `key` from the local store only.
    pub async fn remove_information(&self, key: Id) -> Result<()> {
        self.check_id(key)?;
        tracing::debug!("[{}] remove information {}", self.id, key);
        self.storage.remove(key).await
    }

    /// Bound `fut` by the rpc timeout. A target that cannot be reached is dropped from
    /// the local view before the error is returned.
    async fn remote<T, F>(&self, target: Id, fut: F) -> Result<T>
    where F: Future<Output = Result<T>> + Send {
        let ret = match tokio::time::timeout(self.rpc_timeout, fut).await {
            Ok(ret) => ret,
            Err(_) => Err(Error::PeerUnreachable(target)),
        };
        if let Err(Error::PeerUnreachable(dead)) = &ret {
            if *dead == target {
                tracing::warn!("[{}] peer {} is unreachable", self.id, target);
                if let Err(e) = self.handle_dead_node(target).await {
                    tracing::error!("[{}] Failed on handle dead node {}: {:?}", self.id, target, e);
                }
            }
        }
        ret
    }

    pub(crate) async fn rpc_find_successor(&self, target: Id, key: Id) -> Result<Id> {
        if target == self.id {
            return self.find_successor(key).await;
        }
        self.remote(target, self.transport.find_successor(target, key))
            .await
    }

    pub(crate) async fn rpc_get_predecessor(&self, target: Id) -> Result<Option<Id>> {
        if target == self.id {
            return self.predecessor();
        }
        self.remote(target, self.transport.get_predecessor(target))
            .await
    }

    pub(crate) async fn rpc_set_predecessor(
        &self,
        target: Id,
        predecessor: Option<Id>,
    ) -> Result<()> {
        if target == self.id {
            return self.set_predecessor(predecessor);
        }
        self.remote(target, self.transport.set_predecessor(target, predecessor))
            .await
    }

    pub(crate) async fn rpc_set_successor(&self, target: Id, successor: Id) -> Result<()> {
        if target == self.id {
            return self.set_successor(successor);
        }
        self.remote(target, self.transport.set_successor(target, successor))
            .await
    }

    pub(crate) async fn rpc_notify(&self, target: Id, candidate: Id) -> Result<()> {
        if target == self.id {
            return self.notify(candidate).await;
        }
        self.remote(target, self.transport.notify(target, candidate))
            .await
    }

    pub(crate) async fn rpc_update_finger_table(&self, target: Id, s: Id, i: usize) -> Result<()> {
        if target == self.id {
            return self.update_finger_table(s, i).await;
        }
        self.remote(target, self.transport.update_finger_table(target, s, i))
            .await
    }

    pub(crate) async fn rpc_get_information(&self, target: Id, key: Id) -> Result<Option<String>> {
        if target == self.id {
            return self.local_information(key).await;
        }
        self.remote(target, self.transport.get_information(target, key))
            .await
    }

    pub(crate) async fn rpc_add_information(&self, target: Id, key: Id, value: &str) -> Result<()> {
        if target == self.id {
            return self.add_information(key, value).await;
        }
        self.remote(
            target,
            self.transport
                .add_information(target, key, value.to_string()),
        )
        .await
    }

    pub(crate) async fn rpc_remove_information(&self, target: Id, key: Id) -> Result<()> {
        if target == self.id {
            return self.remove_information(key).await;
        }
        self.remote(target, self.transport.remove_information(target, key))
            .await
    }
}

#[async_trait]
impl Chord for PeerRing {
    /// Without a bootstrap node, start a ring of one. Otherwise build the finger table
    /// from the bootstrap node and announce this node to everyone that should point at it.
    async fn join(&self, bootstrap: Option<Id>) -> Result<()> {
        match bootstrap.filter(|b| *b != self.id) {
            None => {
                let mut state = self.lock_state()?;
                state.finger.fill(self.id);
                state.successor = Some(self.id);
                state.predecessor = Some(self.id);
                tracing::info!("[{}] created a new ring", self.id);
            }
            Some(bootstrap) => {
                tracing::info!("[{}] joining through {}", self.id, bootstrap);
                self.init_finger_table(bootstrap).await?;
                if self.is_joined()? {
                    self.update_others().await;
                }
                tracing::info!(
                    "[{}] joined, successor: {:?}, predecessor: {:?}",
                    self.id,
                    self.successor()?,
                    self.predecessor()?
                );
            }
        }
        *self
            .stats
            .join_time
            .lock()
            .map_err(|_| Error::DHTSyncLockError)? = Some(Utc::now());
        Ok(())
    }

    /// Find the successor of a key.
    /// Asks the network when the answer is not in the local view.
    async fn find_successor(&self, key: Id) -> Result<Id> {
        self.check_id(key)?;
        NodeStats::incr(&self.stats.lookups);
        let successor = self.successor()?.ok_or(Error::NotJoined)?;
        if successor == self.id {
            return Ok(self.id);
        }

        let n = self.find_predecessor(key).await?;
        if n == self.id {
            // the successor may have been replaced during the walk
            return self.successor()?.ok_or(Error::NotJoined);
        }
        tracing::debug!("[{}] find_successor({}) forwarded to {}", self.id, key, n);
        self.rpc_find_successor(n, key).await
    }

    async fn find_predecessor(&self, key: Id) -> Result<Id> {
        self.check_id(key)?;
        NodeStats::incr(&self.stats.lookups);
        let successor = self.successor()?.ok_or(Error::NotJoined)?;
        if successor == self.id {
            return Ok(self.id);
        }

        let mut n = self.id;
        let mut succ = successor;
        let mut hops = 0;
        while !in_range(key, n, succ, Bound::RightClosed) {
            if hops > self.space.bits() {
                tracing::warn!(
                    "[{}] find_predecessor({}) gave up after {} hops at {}",
                    self.id,
                    key,
                    hops,
                    n
                );
                break;
            }
            let candidate = self.closest_preceding_node(key)?;
            if candidate == n {
                break;
            }
            n = candidate;
            succ = self.find_successor(n).await?;
            hops += 1;
        }
        Ok(n)
    }

    fn closest_preceding_node(&self, key: Id) -> Result<Id> {
        Ok(self.lock_state()?.finger.closest_preceding(key))
    }

    /// Accept `candidate` as predecessor if it is closer than the recorded one.
    async fn notify(&self, candidate: Id) -> Result<()> {
        self.check_id(candidate)?;
        let mut state = self.lock_state()?;
        let accept = match state.predecessor {
            None => true,
            Some(p) => in_range(candidate, p, self.id, Bound::Open),
        };
        if accept {
            tracing::info!(
                "[{}] predecessor {:?} -> {}",
                self.id,
                state.predecessor,
                candidate
            );
            state.predecessor = Some(candidate);
        } else {
            tracing::debug!(
                "[{}] kept predecessor {:?} over {}",
                self.id,
                state.predecessor,
                candidate
            );
        }
        Ok(())
    }

    async fn stabilize(&self) -> Result<()> {
        NodeStats::incr(&self.stats.stabilizations);
        let Some(successor) = self.successor()? else {
            return Ok(());
        };

        match self.rpc_get_predecessor(successor).await {
            Ok(Some(x)) if in_range(x, self.id, successor, Bound::RightClosed) => {
                if x != successor {
                    tracing::info!("[{}] successor {} -> {}", self.id, successor, x);
                }
                self.lock_state()?.set_successor(x);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    "[stabilize] Failed on get predecessor of successor {}: {:?}",
                    successor,
                    e
                );
            }
        }

        // a dead successor has been replaced by now
        let successor = self.successor()?;
        if let Some(s) = successor.filter(|s| *s != self.id) {
            if let Err(e) = self.rpc_notify(s, self.id).await {
                tracing::error!("[stabilize] Failed on notify successor {}: {:?}", s, e);
            }
        }

        let predecessor = self.predecessor()?;
        if let Some(p) = predecessor.filter(|p| *p != self.id) {
            if let Err(e) = self.rpc_get_predecessor(p).await {
                tracing::warn!("[stabilize] Failed on probe predecessor {}: {:?}", p, e);
            }
        }

        let mut state = self.lock_state()?;
        let unresolved = |v: Option<Id>| v.map_or(true, |v| v == self.id);
        if unresolved(state.successor) && unresolved(state.predecessor) {
            if state.predecessor.is_none() {
                tracing::info!("[{}] collapsed to a ring of one", self.id);
            }
            state.set_successor(self.id);
            state.predecessor = Some(self.id);
        }
        Ok(())
    }

    /// Recompute every finger. An entry whose lookup fails keeps its current value.
    async fn fix_fingers(&self) -> Result<()> {
        NodeStats::incr(&self.stats.finger_fixes);
        if !self.is_joined()? {
            return Ok(());
        }
        for i in 0..self.space.bits() as usize {
            let start = self.space.start(self.id, i);
            match self.find_successor(start).await {
                Ok(s) => {
                    self.lock_state()?.set_finger(i, s);
                }
                Err(e) => {
                    tracing::debug!("[{}] fix_fingers skipped finger {}: {:?}", self.id, i, e);
                }
            }
        }
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        let (successor, predecessor) = {
            let state = self.lock_state()?;
            (state.successor, state.predecessor)
        };
        let Some(successor) = successor else {
            return Ok(());
        };
        let predecessor = predecessor.filter(|p| *p != self.id);
        if successor == self.id && predecessor.is_none() {
            return Ok(());
        }

        // a node that is its own successor leaves its keys to the predecessor
        let heir = match predecessor {
            Some(p) if successor == self.id => p,
            _ => successor,
        };
        self.hand_over(heir).await?;
        self.splice(predecessor, successor).await;
        self.storage.clear().await?;
        tracing::info!("[{}] left the ring", self.id);
        Ok(())
    }

    async fn update_finger_table(&self, s: Id, i: usize) -> Result<()> {
        if i >= self.space.bits() as usize {
            return Err(Error::InvalidFingerIndex(i));
        }
        self.check_id(s)?;
        if s == self.id {
            return Ok(());
        }
        let forward = {
            let mut state = self.lock_state()?;
            let replace = match state.finger[i] {
                None => true,
                Some(f) => in_range(s, self.id, f, Bound::Open),
            };
            if !replace {
                return Ok(());
            }
            tracing::debug!("[{}] finger {} -> {}", self.id, i, s);
            state.set_finger(i, s);
            state.predecessor.filter(|p| *p != self.id)
        };
        if let Some(p) = forward {
            self.rpc_update_finger_table(p, s, i).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChordStorage for PeerRing {
    async fn get_information(&self, key: Id) -> Result<Option<String>> {
        self.check_id(key)?;
        let owner = self.find_successor(key).await?;
        tracing::debug!("[{}] information {} is owned by {}", self.id, key, owner);
        self.rpc_get_information(owner, key).await
    }

    async fn create_info(&self, key: Id, value: String) -> Result<bool> {
        self.check_id(key)?;
        if self.get_information(key).await?.is_some() {
            return Ok(false);
        }
        let owner = self.find_successor(key).await?;
        self.rpc_add_information(owner, key, &value).await?;
        Ok(true)
    }

    async fn remove_info(&self, key: Id) -> Result<bool> {
        self.check_id(key)?;
        if self.get_information(key).await?.is_none() {
            return Ok(false);
        }
        let owner = self.find_successor(key).await?;
        self.rpc_remove_information(owner, key).await?;
        Ok(true)
    }
}
