#![warn(missing_docs)]

//! Identifiers of the ring and the modular arithmetic over them.
//!
//! Every node and every key lives on a circle of `2^m` slots. Ordering on a circle is
//! only meaningful relative to a reference point, so instead of comparing two ids
//! directly the protocol asks whether a key falls in a clockwise interval
//! `(start, end)`, see [in_range].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::MAX_ID_BITS;
use crate::error::Error;
use crate::error::Result;

/// Position on the ring, an integer in `[0, 2^m)`.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd, Debug, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct Id(u64);

impl Id {
    /// Wrap a raw value. No range check is done here, see [IdSpace::id].
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    /// Raw value of the id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Which endpoints of a clockwise interval are part of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    /// `(start, end)`
    Open,
    /// `[start, end)`
    LeftClosed,
    /// `(start, end]`
    RightClosed,
    /// `[start, end]`
    Closed,
}

impl Bound {
    fn include_start(self) -> bool {
        matches!(self, Self::LeftClosed | Self::Closed)
    }

    fn include_end(self) -> bool {
        matches!(self, Self::RightClosed | Self::Closed)
    }
}

/// Check whether `key` lies on the clockwise walk from `start` to `end`.
///
/// The walk wraps past `2^m - 1` to `0`. When `start == end` the interval is the whole
/// ring except `start` itself, whatever the bound is. That is the shape of the interval
/// a node sees when the ring holds exactly one other member.
pub fn in_range(key: Id, start: Id, end: Id, bound: Bound) -> bool {
    if start == end {
        return key != start;
    }

    let after_start = if bound.include_start() {
        key >= start
    } else {
        key > start
    };
    let before_end = if bound.include_end() {
        key <= end
    } else {
        key < end
    };

    if start < end {
        after_start && before_end
    } else {
        // wrapped past zero
        after_start || before_end
    }
}

/// An `m`-bit identifier space, shared by every node of one ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSpace {
    bits: u8,
}

impl IdSpace {
    /// Create a space of `2^bits` slots.
    pub fn new(bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_ID_BITS {
            return Err(Error::InvalidIdBits(bits));
        }
        Ok(Self { bits })
    }

    /// `m`, which is also the length of every finger table.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of slots, `2^m`.
    pub fn size(&self) -> u64 {
        1u64 << self.bits
    }

    fn mask(&self) -> u64 {
        self.size() - 1
    }

    /// Check that `v` is a valid position and wrap it.
    pub fn id(&self, v: u64) -> Result<Id> {
        if v >= self.size() {
            return Err(Error::IdOutOfRange(v, self.bits));
        }
        Ok(Id(v))
    }

    /// Is `id` a position of this space.
    pub fn contains(&self, id: Id) -> bool {
        id.0 < self.size()
    }

    /// `(id + 2^i) mod 2^m`, the start of finger `i`.
    pub fn start(&self, id: Id, i: usize) -> Id {
        Id(id.0.wrapping_add(1u64 << i) & self.mask())
    }

    /// `(id - 2^i) mod 2^m`, the last id whose finger `i` may point at `id`.
    pub fn back(&self, id: Id, i: usize) -> Id {
        Id(id.0.wrapping_sub(1u64 << i) & self.mask())
    }
}
