#![doc = include_str!("../README.md")]
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod server;
pub mod transport;
pub mod util;
