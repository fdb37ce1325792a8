//! [Transport] of the ring over JSON-RPC.
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chordring_core::dht::Id;
use chordring_core::error::Error as CoreError;
use chordring_core::error::Result as CoreResult;
use chordring_core::transport::Transport;
use dashmap::DashMap;

use crate::rpc::client::RpcError;
use crate::rpc::Client;

/// Reach peers through the endpoint urls of a static table.
///
/// A peer that is not in the table, refuses the connection, answers with an HTTP error or
/// does not answer in time is [CoreError::PeerUnreachable]. A JSON-RPC error returned by the
/// peer is [CoreError::RemoteCall]: the peer is alive, something downstream of it failed.
pub struct HttpTransport {
    peers: DashMap<Id, Client>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            peers: DashMap::new(),
            timeout,
        }
    }

    pub fn new_with_peers(peers: &BTreeMap<Id, String>, timeout: Duration) -> Self {
        let transport = Self::new(timeout);
        for (id, url) in peers {
            transport.add_peer(*id, url);
        }
        transport
    }

    pub fn add_peer(&self, id: Id, endpoint_url: &str) {
        self.peers.insert(
            id,
            Client::new(endpoint_url).with_timeout(self.timeout),
        );
    }

    fn client(&self, target: Id) -> CoreResult<Client> {
        self.peers
            .get(&target)
            .map(|c| c.value().clone())
            .ok_or(CoreError::PeerUnreachable(target))
    }
}

fn map_err(target: Id) -> impl FnOnce(RpcError) -> CoreError {
    move |e| {
        if e.is_unreachable() {
            tracing::debug!("peer {} unreachable: {}", target, e);
            CoreError::PeerUnreachable(target)
        } else {
            CoreError::RemoteCall {
                target,
                reason: match e {
                    RpcError::JsonClientError(e) => e.message,
                    e => e.to_string(),
                },
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn find_successor(&self, target: Id, key: Id) -> CoreResult<Id> {
        self.client(target)?
            .find_successor(key)
            .await
            .map_err(map_err(target))
    }

    async fn get_predecessor(&self, target: Id) -> CoreResult<Option<Id>> {
        self.client(target)?
            .get_predecessor()
            .await
            .map_err(map_err(target))
    }

    async fn set_predecessor(&self, target: Id, predecessor: Option<Id>) -> CoreResult<()> {
        self.client(target)?
            .set_predecessor(predecessor)
            .await
            .map_err(map_err(target))
    }

    async fn set_successor(&self, target: Id, successor: Id) -> CoreResult<()> {
        self.client(target)?
            .set_successor(successor)
            .await
            .map_err(map_err(target))
    }

    async fn notify(&self, target: Id, candidate: Id) -> CoreResult<()> {
        self.client(target)?
            .notify(candidate)
            .await
            .map_err(map_err(target))
    }

    async fn update_finger_table(&self, target: Id, s: Id, index: usize) -> CoreResult<()> {
        self.client(target)?
            .update_finger_table(s, index)
            .await
            .map_err(map_err(target))
    }

    async fn get_information(&self, target: Id, key: Id) -> CoreResult<Option<String>> {
        self.client(target)?
            .get_information(key)
            .await
            .map_err(map_err(target))
    }

    async fn add_information(&self, target: Id, key: Id, value: String) -> CoreResult<()> {
        self.client(target)?
            .add_information(key, value)
            .await
            .map_err(map_err(target))
    }

    async fn remove_information(&self, target: Id, key: Id) -> CoreResult<()> {
        self.client(target)?
            .remove_information(key)
            .await
            .map_err(map_err(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_peer_is_unreachable() {
        let transport = HttpTransport::new(Duration::from_millis(200));
        assert!(matches!(
            transport.get_predecessor(Id::new(3)).await,
            Err(CoreError::PeerUnreachable(id)) if id == Id::new(3)
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        // nothing listens on the discard port
        let mut peers = BTreeMap::new();
        peers.insert(Id::new(7), "http://127.0.0.1:9".to_string());
        let transport = HttpTransport::new_with_peers(&peers, Duration::from_millis(500));
        assert!(matches!(
            transport.find_successor(Id::new(7), Id::new(1)).await,
            Err(CoreError::PeerUnreachable(id)) if id == Id::new(7)
        ));
    }

    #[test]
    fn test_rpc_failure_is_remote_call() {
        let err = map_err(Id::new(12))(RpcError::JsonClientError(jsonrpc_core::Error::new(
            jsonrpc_core::ErrorCode::ServerError(1102),
        )));
        assert!(matches!(
            err,
            CoreError::RemoteCall { target, .. } if target == Id::new(12)
        ));
        let err = map_err(Id::new(12))(RpcError::Timeout);
        assert!(err.is_unreachable());
    }
}
