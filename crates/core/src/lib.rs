//! ChordRing core: a Chord distributed hash table.
//! --------------
//! - [PeerRing](crate::dht::PeerRing) holds the view one node has of the ring and runs the
//!   [Chord](crate::dht::Chord) protocol: join, lookup, stabilize, notify, fix_fingers, leave.
//! - [ChordStorage](crate::dht::ChordStorage) stores values at the node owning their key.
//! - [Transport](crate::transport::Transport) is the capability a node needs to call the same
//!   protocol on another node. This crate does not ship a network implementation.
//! - [Stabilizer](crate::dht::Stabilizer) runs the periodic maintenance of a node.
//!
//! # Ring
//!
//! Nodes and keys share an `m`-bit identifier space. A key is owned by its successor,
//! the first node clockwise from it. Every node keeps a successor, a predecessor and a
//! finger table whose entry `i` points at the successor of `id + 2^i`, which makes a
//! lookup take `O(log n)` hops.
//!
//! # Failures
//!
//! Every remote call is bounded by a timeout. A peer that does not answer is removed from
//! the local view on the spot and replaced by the next finger that answers. Periodic
//! stabilization repairs the rest.
#![warn(missing_docs)]

pub mod consts;
pub mod dht;
pub mod error;
#[allow(missing_docs)]
pub mod inspect;
#[allow(missing_docs)]
pub mod storage;
pub mod transport;

#[cfg(test)]
pub mod tests;
