//! JSON-RPC surface shared by the server endpoint and the client.
pub mod client;
pub mod method;
pub mod types;

pub use client::Client;
pub use client::RpcError;
pub use method::Method;
