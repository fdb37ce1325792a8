//! Transport is the only seam between the ring protocol and the network.
//!
//! A [PeerRing](crate::dht::PeerRing) never talks to sockets. Whenever it needs the
//! view of another node it calls one of the methods below with the id of that node,
//! and the implementation decides how the call travels. The node crate ships a
//! JSON-RPC over HTTP implementation, tests use an in-memory registry.
//!
//! Implementations must report a peer that cannot be reached (connection refused,
//! unknown address, no answer) as [Error::PeerUnreachable](crate::error::Error::PeerUnreachable)
//! carrying the *target* id, and a peer that answered with a failure as
//! [Error::RemoteCall](crate::error::Error::RemoteCall). The caller only marks a node
//! dead for the former. Timeouts are enforced by the caller.

use async_trait::async_trait;

use crate::dht::Id;
use crate::error::Result;

/// Remote invocation of the protocol operations of a numbered peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `target.find_successor(key)`
    async fn find_successor(&self, target: Id, key: Id) -> Result<Id>;

    /// Predecessor recorded by `target`. Also used as a liveness probe.
    async fn get_predecessor(&self, target: Id) -> Result<Option<Id>>;

    /// Overwrite the predecessor of `target`.
    async fn set_predecessor(&self, target: Id, predecessor: Option<Id>) -> Result<()>;

    /// Overwrite the successor of `target`.
    async fn set_successor(&self, target: Id, successor: Id) -> Result<()>;

    /// `target.notify(candidate)`
    async fn notify(&self, target: Id, candidate: Id) -> Result<()>;

    /// `target.update_finger_table(s, index)`
    async fn update_finger_table(&self, target: Id, s: Id, index: usize) -> Result<()>;

    /// Read `key` from the local store of `target`, without routing.
    async fn get_information(&self, target: Id, key: Id) -> Result<Option<String>>;

    /// Write `key` into the local store of `target`, without routing.
    async fn add_information(&self, target: Id, key: Id, value: String) -> Result<()>;

    /// Delete `key` from the local store of `target`, without routing.
    async fn remove_information(&self, target: Id, key: Id) -> Result<()>;
}
