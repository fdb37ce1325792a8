//! JSON-RPC client of a chordring node.
use std::time::Duration;

use chordring_core::dht::Id;
use chordring_core::inspect::NodeInspect;
use chordring_core::inspect::StatsInspect;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::method::Method;
use super::types::*;

/// Wrap json_client send request between nodes, or from the command line to a node.
#[derive(Clone)]
pub struct Client {
    client: HttpClient,
    endpoint_url: String,
    timeout: Option<Duration>,
}

/// The errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// An error returned by the server.
    #[error("Server returned rpc error {0}")]
    JsonClientError(jsonrpc_core::Error),
    /// Failure to parse server response.
    #[error("Failed to parse server response as {0}: {1}")]
    ParseError(String, Box<dyn std::error::Error + Send + Sync>),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// The request could not be delivered.
    #[error("Client error: {0}")]
    Client(String),
    /// Not rpc specific errors.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl RpcError {
    /// The server never answered: connection failure, HTTP failure, or timeout.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, RpcError::Timeout | RpcError::Client(_))
    }
}

/// A wrap `Result` contains ClientError.
type Result<T> = std::result::Result<T, RpcError>;

fn send_error(e: reqwest::Error) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout
    } else {
        RpcError::Client(e.to_string())
    }
}

impl Client {
    /// Creates a new Client instance with the specified endpoint URL
    pub fn new(endpoint_url: &str) -> Self {
        Self {
            client: HttpClient::default(),
            endpoint_url: endpoint_url.to_string(),
            timeout: None,
        }
    }

    /// Bound every request of this client by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn call_method<T>(&self, method: Method, req: &impl Serialize) -> Result<T>
    where T: DeserializeOwned {
        use jsonrpc_core::*;

        let params = serde_json::to_value(req)
            .map_err(|e| RpcError::Client(e.to_string()))?
            .as_object()
            .ok_or(RpcError::Client("params should be an object".to_string()))?
            .clone();

        let jsonrpc_request = Request::Single(Call::MethodCall(MethodCall {
            jsonrpc: Some(Version::V2),
            method: method.to_string(),
            params: Params::Map(params),
            id: Id::Num(1),
        }));

        let result = self.do_jsonrpc_request(&jsonrpc_request).await?;
        serde_json::from_value(result).map_err(|e| RpcError::ParseError(e.to_string(), Box::new(e)))
    }

    async fn do_jsonrpc_request(&self, req: &jsonrpc_core::Request) -> Result<serde_json::Value> {
        let body = serde_json::to_string(req).map_err(|e| RpcError::Client(e.to_string()))?;

        let mut req = self
            .client
            .post(self.endpoint_url.as_str())
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(body);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let resp = req
            .send()
            .await
            .map_err(send_error)?
            .error_for_status()
            .map_err(send_error)?
            .bytes()
            .await
            .map_err(send_error)?;

        let jsonrpc_resp = jsonrpc_core::Response::from_json(&String::from_utf8_lossy(&resp))
            .map_err(|e| RpcError::ParseError(e.to_string(), Box::new(e)))?;

        match jsonrpc_resp {
            jsonrpc_core::Response::Single(resp) => match resp {
                jsonrpc_core::Output::Success(success) => Ok(success.result),
                jsonrpc_core::Output::Failure(failure) => {
                    Err(RpcError::JsonClientError(failure.error))
                }
            },
            jsonrpc_core::Response::Batch(_) => Err(RpcError::Other(
                "Batch response is not supported".into(),
            )),
        }
    }

    /// Successor of `key`, as routed by the remote node.
    pub async fn find_successor(&self, key: Id) -> Result<Id> {
        self.call_method(Method::FindSuccessor, &KeyRequest { key })
            .await
    }

    pub async fn get_predecessor(&self) -> Result<Option<Id>> {
        self.call_method(Method::GetPredecessor, &EmptyRequest {})
            .await
    }

    pub async fn set_predecessor(&self, predecessor: Option<Id>) -> Result<()> {
        self.call_method(Method::SetPredecessor, &SetPredecessorRequest {
            predecessor,
        })
        .await
    }

    pub async fn set_successor(&self, id: Id) -> Result<()> {
        self.call_method(Method::SetSuccessor, &NodeRequest { id })
            .await
    }

    pub async fn notify(&self, id: Id) -> Result<()> {
        self.call_method(Method::Notify, &NodeRequest { id }).await
    }

    pub async fn update_finger_table(&self, s: Id, index: usize) -> Result<()> {
        self.call_method(Method::UpdateFingerTable, &UpdateFingerTableRequest {
            s,
            index,
        })
        .await
    }

    pub async fn get_information(&self, key: Id) -> Result<Option<String>> {
        self.call_method(Method::GetInformation, &KeyRequest { key })
            .await
    }

    pub async fn add_information(&self, key: Id, value: String) -> Result<()> {
        self.call_method(Method::AddInformation, &InformationRequest { key, value })
            .await
    }

    pub async fn remove_information(&self, key: Id) -> Result<()> {
        self.call_method(Method::RemoveInformation, &KeyRequest { key })
            .await
    }

    /// Pointers, finger table and stored items of the node.
    pub async fn node_info(&self) -> Result<NodeInspect> {
        self.call_method(Method::NodeInfo, &EmptyRequest {}).await
    }

    pub async fn node_stats(&self) -> Result<StatsInspect> {
        self.call_method(Method::NodeStats, &EmptyRequest {}).await
    }

    /// Run a maintenance pass now, returns the node state after it.
    pub async fn stabilize(&self) -> Result<NodeInspect> {
        self.call_method(Method::Stabilize, &EmptyRequest {}).await
    }

    pub async fn lookup(&self, key: Id) -> Result<Id> {
        self.call_method(Method::Lookup, &KeyRequest { key }).await
    }

    /// Returns `false` if the key already had a value.
    pub async fn create_info(&self, key: Id, value: String) -> Result<bool> {
        self.call_method(Method::CreateInfo, &InformationRequest { key, value })
            .await
    }

    pub async fn get_info(&self, key: Id) -> Result<Option<String>> {
        self.call_method(Method::GetInfo, &KeyRequest { key }).await
    }

    /// Returns `false` if the key had no value.
    pub async fn remove_info(&self, key: Id) -> Result<bool> {
        self.call_method(Method::RemoveInfo, &KeyRequest { key })
            .await
    }

    /// Ask the node to leave the ring and shut down.
    pub async fn leave(&self) -> Result<()> {
        self.call_method(Method::Leave, &EmptyRequest {}).await
    }
}
