use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::dht::Chord;
use crate::dht::Id;
use crate::dht::NodeConfig;
use crate::dht::PeerRing;
use crate::error::Error;
use crate::error::Result;
use crate::transport::Transport;

mod test_ring;
mod test_storage;

/// In-process transport: every node of a test ring is registered here by id.
/// A node that is not registered, or has been killed, is unreachable.
#[derive(Default)]
pub struct MemoryRegistry {
    nodes: DashMap<Id, Arc<PeerRing>>,
}

impl MemoryRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build a node that talks through this registry and register it.
    pub fn spawn(self: &Arc<Self>, id: u64, bits: u8) -> Result<Arc<PeerRing>> {
        let node = Arc::new(PeerRing::new(NodeConfig::new(id, bits), self.clone())?);
        self.register(node.clone());
        Ok(node)
    }

    pub fn register(&self, node: Arc<PeerRing>) {
        self.nodes.insert(node.id, node);
    }

    /// Make `id` unreachable, as if its process died.
    pub fn kill(&self, id: Id) -> Option<Arc<PeerRing>> {
        self.nodes.remove(&id).map(|(_, node)| node)
    }

    fn node(&self, id: Id) -> Result<Arc<PeerRing>> {
        self.nodes
            .get(&id)
            .map(|n| n.value().clone())
            .ok_or(Error::PeerUnreachable(id))
    }
}

fn remote_err(target: Id) -> impl FnOnce(Error) -> Error {
    move |e| Error::RemoteCall {
        target,
        reason: e.to_string(),
    }
}

#[async_trait]
impl Transport for MemoryRegistry {
    async fn find_successor(&self, target: Id, key: Id) -> Result<Id> {
        let node = self.node(target)?;
        node.find_successor(key).await.map_err(remote_err(target))
    }

    async fn get_predecessor(&self, target: Id) -> Result<Option<Id>> {
        let node = self.node(target)?;
        node.predecessor().map_err(remote_err(target))
    }

    async fn set_predecessor(&self, target: Id, predecessor: Option<Id>) -> Result<()> {
        let node = self.node(target)?;
        node.set_predecessor(predecessor)
            .map_err(remote_err(target))
    }

    async fn set_successor(&self, target: Id, successor: Id) -> Result<()> {
        let node = self.node(target)?;
        node.set_successor(successor).map_err(remote_err(target))
    }

    async fn notify(&self, target: Id, candidate: Id) -> Result<()> {
        let node = self.node(target)?;
        node.notify(candidate).await.map_err(remote_err(target))
    }

    async fn update_finger_table(&self, target: Id, s: Id, index: usize) -> Result<()> {
        let node = self.node(target)?;
        node.update_finger_table(s, index)
            .await
            .map_err(remote_err(target))
    }

    async fn get_information(&self, target: Id, key: Id) -> Result<Option<String>> {
        let node = self.node(target)?;
        node.local_information(key)
            .await
            .map_err(remote_err(target))
    }

    async fn add_information(&self, target: Id, key: Id, value: String) -> Result<()> {
        let node = self.node(target)?;
        node.add_information(key, &value)
            .await
            .map_err(remote_err(target))
    }

    async fn remove_information(&self, target: Id, key: Id) -> Result<()> {
        let node = self.node(target)?;
        node.remove_information(key)
            .await
            .map_err(remote_err(target))
    }
}

/// Run `rounds` rounds of maintenance. A round stabilizes every node, then fixes the
/// fingers of every node.
pub async fn run_rounds(nodes: &[Arc<PeerRing>], rounds: usize) -> Result<()> {
    for _ in 0..rounds {
        for node in nodes {
            node.stabilize().await?;
        }
        for node in nodes {
            node.fix_fingers().await?;
        }
    }
    Ok(())
}

/// Join `ids` one by one through the first of them, then stabilize for `rounds` rounds.
pub async fn gen_ring(
    bits: u8,
    ids: &[u64],
    rounds: usize,
) -> Result<(Arc<MemoryRegistry>, Vec<Arc<PeerRing>>)> {
    super::setup_tracing();
    let registry = MemoryRegistry::new();
    let mut nodes = vec![];
    for id in ids {
        nodes.push(registry.spawn(*id, bits)?);
    }
    let bootstrap = nodes.first().map(|n| n.id);
    for node in nodes.iter() {
        node.join(bootstrap).await?;
    }
    run_rounds(&nodes, rounds).await?;
    Ok((registry, nodes))
}

/// Successor of `key` among `ids`, computed by brute force.
pub fn expected_successor(ids: &[u64], key: u64) -> Id {
    let mut sorted = ids.to_vec();
    sorted.sort();
    let owner = sorted
        .iter()
        .find(|&&id| id >= key)
        .or_else(|| sorted.first())
        .copied()
        .unwrap_or(key);
    Id::new(owner)
}
