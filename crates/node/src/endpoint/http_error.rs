//! Failures answered with a plain HTTP status, outside of JSON-RPC.
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

#[derive(Debug)]
pub enum HttpError {
    /// The body is not a JSON-RPC call, or is a notification that gets no answer.
    BadRequest,
    /// The ring state of the node could not be read.
    NodeUnavailable(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request".to_string()),
            HttpError::NodeUnavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Node unavailable: {reason}"),
            ),
        }
        .into_response()
    }
}
