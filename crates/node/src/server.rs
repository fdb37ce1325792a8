#![warn(missing_docs)]
//! A jsonrpc-server of chordring-node.
//! Every method of the ring protocol is exposed here so that the [HttpTransport] of other
//! nodes can reach this one, next to the administrative methods used by the command line.
//!
//! An absent value is sent as `null`. Any failure, including an unreachable peer further
//! down the ring, is sent as a JSON-RPC error carrying the code of [ServerError].
//!
//! [HttpTransport]: crate::transport::HttpTransport
use std::sync::Arc;

use chordring_core::dht::Chord;
use chordring_core::dht::ChordStorage;
use chordring_core::dht::Id;
use chordring_core::dht::PeerRing;
use chordring_core::dht::Stabilizer;
use chordring_core::inspect::NodeInspect;
use chordring_core::inspect::StatsInspect;
use jsonrpc_core::Error;
use jsonrpc_core::MetaIoHandler;
use jsonrpc_core::Metadata;
use jsonrpc_core::Params;
use jsonrpc_core::Result;
use jsonrpc_core::Value;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Error as ServerError;
use crate::rpc::method::Method;
use crate::rpc::types::*;

/// RpcMeta basic info struct
/// * node: the local view of the ring.
/// * stabilizer: runs a maintenance pass on demand.
/// * shutdown: cancelled when a client asks the node to leave.
#[derive(Clone)]
pub struct RpcMeta {
    node: Arc<PeerRing>,
    stabilizer: Arc<Stabilizer>,
    shutdown: CancellationToken,
}

/// `MetaIoHandler<T>, T: Metadata`
impl Metadata for RpcMeta {}

impl RpcMeta {
    /// Bundle what the handlers need.
    pub fn new(node: Arc<PeerRing>, shutdown: CancellationToken) -> Self {
        let stabilizer = Arc::new(Stabilizer::new(node.clone()));
        Self {
            node,
            stabilizer,
            shutdown,
        }
    }

    /// The node served.
    pub fn node(&self) -> Arc<PeerRing> {
        self.node.clone()
    }
}

/// Build handler add method with metadata.
pub fn build_handler(handler: &mut MetaIoHandler<RpcMeta>) {
    handler.add_method_with_meta(Method::FindSuccessor.as_str(), find_successor);
    handler.add_method_with_meta(Method::GetPredecessor.as_str(), get_predecessor);
    handler.add_method_with_meta(Method::SetPredecessor.as_str(), set_predecessor);
    handler.add_method_with_meta(Method::SetSuccessor.as_str(), set_successor);
    handler.add_method_with_meta(Method::Notify.as_str(), notify);
    handler.add_method_with_meta(Method::UpdateFingerTable.as_str(), update_finger_table);
    handler.add_method_with_meta(Method::GetInformation.as_str(), get_information);
    handler.add_method_with_meta(Method::AddInformation.as_str(), add_information);
    handler.add_method_with_meta(Method::RemoveInformation.as_str(), remove_information);
    handler.add_method_with_meta(Method::NodeInfo.as_str(), node_info);
    handler.add_method_with_meta(Method::NodeStats.as_str(), node_stats);
    handler.add_method_with_meta(Method::Stabilize.as_str(), stabilize);
    handler.add_method_with_meta(Method::Lookup.as_str(), lookup);
    handler.add_method_with_meta(Method::CreateInfo.as_str(), create_info);
    handler.add_method_with_meta(Method::GetInfo.as_str(), get_info);
    handler.add_method_with_meta(Method::RemoveInfo.as_str(), remove_info);
    handler.add_method_with_meta(Method::Leave.as_str(), leave);
}

fn core_error(e: chordring_core::error::Error) -> Error {
    Error::from(ServerError::from(e))
}

/// Ids on the wire are plain integers, reject those outside the ring before routing.
fn checked(meta: &RpcMeta, id: Id) -> Result<Id> {
    meta.node.check_id(id).map_err(core_error)
}

fn to_value<T: Serialize>(v: T) -> Result<Value> {
    serde_json::to_value(v).map_err(|e| Error::from(ServerError::from(e)))
}

async fn find_successor(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    let id = meta
        .node
        .find_successor(req.key)
        .await
        .map_err(core_error)?;
    to_value(id)
}

async fn get_predecessor(_: Params, meta: RpcMeta) -> Result<Value> {
    let predecessor = meta.node.predecessor().map_err(core_error)?;
    to_value(predecessor)
}

async fn set_predecessor(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: SetPredecessorRequest = params.parse()?;
    if let Some(p) = req.predecessor {
        checked(&meta, p)?;
    }
    meta.node
        .set_predecessor(req.predecessor)
        .map_err(core_error)?;
    Ok(Value::Null)
}

async fn set_successor(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: NodeRequest = params.parse()?;
    checked(&meta, req.id)?;
    meta.node.set_successor(req.id).map_err(core_error)?;
    Ok(Value::Null)
}

async fn notify(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: NodeRequest = params.parse()?;
    checked(&meta, req.id)?;
    meta.node.notify(req.id).await.map_err(core_error)?;
    Ok(Value::Null)
}

async fn update_finger_table(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: UpdateFingerTableRequest = params.parse()?;
    checked(&meta, req.s)?;
    meta.node
        .update_finger_table(req.s, req.index)
        .await
        .map_err(core_error)?;
    Ok(Value::Null)
}

async fn get_information(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    let value = meta
        .node
        .local_information(req.key)
        .await
        .map_err(core_error)?;
    to_value(value)
}

async fn add_information(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: InformationRequest = params.parse()?;
    checked(&meta, req.key)?;
    meta.node
        .add_information(req.key, &req.value)
        .await
        .map_err(core_error)?;
    Ok(Value::Null)
}

async fn remove_information(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    meta.node
        .remove_information(req.key)
        .await
        .map_err(core_error)?;
    Ok(Value::Null)
}

async fn node_info(_: Params, meta: RpcMeta) -> Result<Value> {
    to_value(NodeInspect::inspect(&meta.node).await)
}

async fn node_stats(_: Params, meta: RpcMeta) -> Result<Value> {
    to_value(StatsInspect::inspect(&meta.node).map_err(core_error)?)
}

async fn stabilize(_: Params, meta: RpcMeta) -> Result<Value> {
    meta.stabilizer.stabilize().await.map_err(core_error)?;
    to_value(NodeInspect::inspect(&meta.node).await)
}

async fn lookup(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    let id = meta
        .node
        .find_successor(req.key)
        .await
        .map_err(core_error)?;
    to_value(id)
}

async fn create_info(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: InformationRequest = params.parse()?;
    checked(&meta, req.key)?;
    let created = meta
        .node
        .create_info(req.key, req.value)
        .await
        .map_err(core_error)?;
    Ok(Value::Bool(created))
}

async fn get_info(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    let value = meta
        .node
        .get_information(req.key)
        .await
        .map_err(core_error)?;
    to_value(value)
}

async fn remove_info(params: Params, meta: RpcMeta) -> Result<Value> {
    let req: KeyRequest = params.parse()?;
    checked(&meta, req.key)?;
    let removed = meta
        .node
        .remove_info(req.key)
        .await
        .map_err(core_error)?;
    Ok(Value::Bool(removed))
}

/// The daemon owning the node stops maintenance, leaves and exits.
async fn leave(_: Params, meta: RpcMeta) -> Result<Value> {
    tracing::info!("leave requested on node {}", meta.node.id);
    meta.shutdown.cancel();
    Ok(Value::Null)
}
