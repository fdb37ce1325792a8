//! Error of chordring_core

use crate::dht::Id;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chordring-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Timeout or connection failure while talking to a known peer.
    /// Always handled at the call site by dropping the peer from the local view.
    #[error("Peer {0} is unreachable")]
    PeerUnreachable(Id),

    /// The peer answered, with an error.
    #[error("Remote call to {target} failed: {reason}")]
    RemoteCall {
        /// the peer that was called
        target: Id,
        /// error reported by the peer
        reason: String,
    },

    #[error("Node has not joined a ring yet")]
    NotJoined,

    #[error("Id {0} is out of range for a {1}-bit identifier space")]
    IdOutOfRange(u64, u8),

    #[error("Identifier space must have between 1 and {max} bits, got {0}", max = crate::consts::MAX_ID_BITS)]
    InvalidIdBits(u8),

    #[error("Finger index {0} is out of range")]
    InvalidFingerIndex(usize),

    #[error("Failed to get dht from a sync lock")]
    DHTSyncLockError,
}

impl Error {
    /// Returns `true` if the error means the target peer did not answer at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::PeerUnreachable(_))
    }
}
