//! Constant variables.

/// Default number of bits of the identifier space, 64 slots.
pub const DEFAULT_ID_BITS: u8 = 6;
/// Identifiers are stored in `u64`, one bit is kept free so `2^m` never overflows.
pub const MAX_ID_BITS: u8 = 63;
/// default timeout of a single remote call in ms
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 2000;
/// default interval between two stabilization passes in seconds
pub const DEFAULT_STABILIZE_INTERVAL_SECS: u64 = 5;
