#![warn(missing_docs)]
//! Implementation of the ring DHT
//! which is based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

mod chord;
/// Finger table of a node
pub mod finger;
pub mod id;
mod membership;
mod stabilization;
pub mod types;

pub use chord::NodeConfig;
pub use chord::NodeStats;
pub use chord::PeerRing;
pub use chord::RingState;
pub use finger::FingerTable;
pub use id::in_range;
pub use id::Bound;
pub use id::Id;
pub use id::IdSpace;
pub use stabilization::Stabilizer;
pub use types::Chord;
pub use types::ChordStorage;
