//! DHT types about `Storage` and `PeerRing`.
#![warn(missing_docs)]
use async_trait::async_trait;

use super::id::Id;
use crate::error::Result;

/// Chord is a distributed hash table (DHT) algorithm that is designed to efficiently
/// distribute data across peer-to-peer network nodes. You may want to browse its
/// [wiki](https://en.wikipedia.org/wiki/Chord_(peer-to-peer)) before you read this.
///
/// Every node runs the same protocol. Calls that need another node's view go through
/// a [Transport](crate::transport::Transport), which lets the implementation recurse
/// into remote nodes that answer with this very trait.
#[async_trait]
pub trait Chord {
    /// Join a ring through `bootstrap`, or start a new one-node ring with `None`.
    async fn join(&self, bootstrap: Option<Id>) -> Result<()>;

    /// Ask DHT for the node responsible for `key`.
    async fn find_successor(&self, key: Id) -> Result<Id>;

    /// Walk the ring towards the node preceding `key`.
    /// The walk is bounded by `m + 1` hops and falls back to the best candidate seen.
    async fn find_predecessor(&self, key: Id) -> Result<Id>;

    /// The farthest finger that strictly precedes `key`, or this node itself.
    fn closest_preceding_node(&self, key: Id) -> Result<Id>;

    /// Notify the DHT that a node may be its predecessor.
    async fn notify(&self, candidate: Id) -> Result<()>;

    /// Correct the successor and predecessor pointers, see the paper's `stabilize`.
    async fn stabilize(&self) -> Result<()>;

    /// Fix finger table by finding the successor for each finger.
    async fn fix_fingers(&self) -> Result<()>;

    /// Hand over owned keys and splice the two neighbours together.
    async fn leave(&self) -> Result<()>;

    /// `s` may be the `i`-th finger of this node. Propagates towards the predecessor.
    async fn update_finger_table(&self, s: Id, i: usize) -> Result<()>;
}

/// ChordStorage is a distributed storage protocol based on Chord algorithm.
///
/// A key is owned by the node returned by `find_successor(key)`. The owner is looked
/// up on every call, while the value stays where it was written until that node leaves.
#[async_trait]
pub trait ChordStorage: Chord {
    /// Read the value stored under `key` by its owner.
    async fn get_information(&self, key: Id) -> Result<Option<String>>;

    /// Store `value` at the owner of `key`. Returns `false` if a value exists already.
    async fn create_info(&self, key: Id, value: String) -> Result<bool>;

    /// Delete `key` at its owner. Returns `false` if there was nothing to delete.
    async fn remove_info(&self, key: Id) -> Result<bool>;
}
