//! chordring-node service endpoint, JSON-RPC over HTTP.
#![warn(missing_docs)]
mod http_error;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use chordring_core::inspect::NodeInspect;
use chordring_core::inspect::StatsInspect;
use jsonrpc_core::MetaIoHandler;
use serde::Deserialize;
use serde::Serialize;

use self::http_error::HttpError;
use crate::error::Error;
use crate::server::build_handler;
use crate::server::RpcMeta;

/// JSON-RPC state
pub struct JsonRpcState {
    meta: RpcMeta,
    io_handler: MetaIoHandler<RpcMeta>,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// version of the running binary
    pub version: String,
    /// pointers, fingers and stored items
    pub node: NodeInspect,
    /// counters
    pub stats: StatsInspect,
}

/// Routes of a node: JSON-RPC on `POST /`, a status snapshot on `GET /status`.
pub fn router(meta: RpcMeta) -> Router {
    let mut io_handler = MetaIoHandler::default();
    build_handler(&mut io_handler);
    let jsonrpc_state = Arc::new(JsonRpcState {
        meta: meta.clone(),
        io_handler,
    });
    let status_state = Arc::new(meta);

    Router::new()
        .route("/", post(jsonrpc_io_handler).with_state(jsonrpc_state))
        .route("/status", get(status_handler).with_state(status_state))
        .layer(axum::middleware::from_fn(node_info_header))
}

/// Run a web server to handle jsonrpc request from other nodes and from the command line,
/// until `shutdown` resolves.
pub async fn run_http_api<F>(addr: &str, meta: RpcMeta, shutdown: F) -> anyhow::Result<()>
where F: Future<Output = ()> + Send + 'static {
    let binding_addr: SocketAddr = addr
        .parse()
        .map_err(|_| Error::InvalidAddress(addr.to_string()))?;

    println!("JSON-RPC endpoint: http://{binding_addr}");
    axum::Server::bind(&binding_addr)
        .serve(router(meta).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn jsonrpc_io_handler(
    State(state): State<Arc<JsonRpcState>>,
    body: String,
) -> Result<JsonResponse, HttpError> {
    let r = state
        .io_handler
        .handle_request(&body, state.meta.clone())
        .await
        .ok_or(HttpError::BadRequest)?;
    Ok(JsonResponse(r))
}

async fn node_info_header<B>(
    req: http::Request<B>,
    next: axum::middleware::Next<B>,
) -> axum::response::Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    if let Ok(version) = http::HeaderValue::from_str(crate::util::build_version().as_str()) {
        headers.insert("X-NODE-VERSION", version);
    }
    res
}

async fn status_handler(
    State(state): State<Arc<RpcMeta>>,
) -> Result<axum::Json<StatusResponse>, HttpError> {
    let node = state.node();
    let stats =
        StatsInspect::inspect(&node).map_err(|e| HttpError::NodeUnavailable(e.to_string()))?;
    Ok(axum::Json(StatusResponse {
        version: crate::util::build_version(),
        node: NodeInspect::inspect(&node).await,
        stats,
    }))
}

/// JSON response struct
#[derive(Debug, Clone)]
pub struct JsonResponse(String);

impl IntoResponse for JsonResponse {
    fn into_response(self) -> axum::response::Response {
        ([("content-type", "application/json")], self.0).into_response()
    }
}
