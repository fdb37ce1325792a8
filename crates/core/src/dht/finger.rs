#![warn(missing_docs)]
use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;

use super::id::in_range;
use super::id::Bound;
use super::id::Id;
use super::id::IdSpace;

/// Finger table of Chord DHT.
/// Entry `i` approximates the successor of `(id + 2^i) mod 2^m`. Entries may be stale
/// or empty, they are repaired lazily by `fix_fingers`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    id: Id,
    finger: Vec<Option<Id>>,
}

impl FingerTable {
    /// builder
    pub fn new(id: Id, space: IdSpace) -> Self {
        Self {
            id,
            finger: vec![None; space.bits() as usize],
        }
    }

    /// Number of slots, always `m`.
    pub fn size(&self) -> usize {
        self.finger.len()
    }

    /// getter
    pub fn get(&self, index: usize) -> &Option<Id> {
        if index >= self.finger.len() {
            return &None;
        }
        &self.finger[index]
    }

    /// setter
    pub fn set(&mut self, index: usize, id: Id) {
        if index >= self.finger.len() {
            return;
        }
        self.finger[index] = Some(id);
    }

    /// Point every slot at `id`, the state of a one-node ring.
    pub fn fill(&mut self, id: Id) {
        self.finger.iter_mut().for_each(|x| *x = Some(id));
    }

    /// remove a node from dht finger table
    pub fn remove(&mut self, id: Id) {
        for item in self.finger.iter_mut() {
            if *item == Some(id) {
                *item = None;
            }
        }
    }

    /// Check finger is contains some node
    pub fn contains(&self, v: Option<Id>) -> bool {
        self.finger.contains(&v)
    }

    /// closest_preceding_node
    /// Scan from the farthest finger down and return the first one strictly between
    /// this node and `key`. Falls back to this node itself.
    pub fn closest_preceding(&self, key: Id) -> Id {
        self.finger
            .iter()
            .rev()
            .flatten()
            .find(|&&v| in_range(v, self.id, key, Bound::Open))
            .copied()
            .unwrap_or(self.id)
    }

    /// Distinct non-empty entries other than this node, in slot order.
    pub fn peers(&self) -> Vec<Id> {
        let mut ret: Vec<Id> = vec![];
        for v in self.finger.iter().flatten() {
            if *v != self.id && !ret.contains(v) {
                ret.push(*v);
            }
        }
        ret
    }

    /// get length of finger
    pub fn len(&self) -> usize {
        self.finger.iter().flatten().count()
    }

    /// get finger list
    pub fn list(&self) -> &Vec<Option<Id>> {
        &self.finger
    }
}

impl Index<usize> for FingerTable {
    type Output = Option<Id>;
    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}
