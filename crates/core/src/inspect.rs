use std::fmt;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::dht::Id;
use crate::dht::PeerRing;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInspect {
    pub id: Id,
    pub id_bits: u8,
    #[serde(default)]
    pub successor: Option<Id>,
    #[serde(default)]
    pub predecessor: Option<Id>,
    pub finger_table: Vec<FingerInspect>,
    pub storage: StorageInspect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerInspect {
    pub start: Id,
    #[serde(default)]
    pub node: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInspect {
    pub items: Vec<(Id, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsInspect {
    pub id: Id,
    pub lookups: u64,
    pub stabilizations: u64,
    pub finger_fixes: u64,
    #[serde(default)]
    pub join_time: Option<DateTime<Utc>>,
}

impl NodeInspect {
    pub async fn inspect(dht: &PeerRing) -> Self {
        let state = dht.state().ok();
        let finger_table = state
            .as_ref()
            .map(|s| {
                s.finger
                    .list()
                    .iter()
                    .enumerate()
                    .map(|(i, node)| FingerInspect {
                        start: dht.space.start(dht.id, i),
                        node: *node,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: dht.id,
            id_bits: dht.space.bits(),
            successor: state.as_ref().and_then(|s| s.successor),
            predecessor: state.as_ref().and_then(|s| s.predecessor),
            finger_table,
            storage: StorageInspect::inspect(dht).await,
        }
    }
}

impl StorageInspect {
    pub async fn inspect(dht: &PeerRing) -> Self {
        Self {
            items: dht.storage.list().await.unwrap_or_default(),
        }
    }
}

impl StatsInspect {
    pub fn inspect(dht: &PeerRing) -> Result<Self> {
        let stats = &dht.stats;
        let join_time = *stats
            .join_time
            .lock()
            .map_err(|_| Error::DHTSyncLockError)?;
        Ok(Self {
            id: dht.id,
            lookups: stats.lookups.load(Ordering::Relaxed),
            stabilizations: stats.stabilizations.load(Ordering::Relaxed),
            finger_fixes: stats.finger_fixes.load(Ordering::Relaxed),
            join_time,
        })
    }
}

fn or_none(id: Option<Id>) -> String {
    id.map(|x| x.to_string())
        .unwrap_or_else(|| "None".to_string())
}

impl fmt::Display for NodeInspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Node {} successor: {}, predecessor: {}",
            self.id,
            or_none(self.successor),
            or_none(self.predecessor)
        )?;
        writeln!(f, "Node {} finger table:", self.id)?;
        if self.finger_table.is_empty() {
            writeln!(f, "No finger table elements to show")?;
        }
        for finger in &self.finger_table {
            writeln!(f, "\tsucc({}): {}", finger.start, or_none(finger.node))?;
        }
        writeln!(f, "Node {} information:", self.id)?;
        for (key, value) in &self.storage.items {
            writeln!(f, "\t{}: {}", key, value)?;
        }
        Ok(())
    }
}

impl fmt::Display for StatsInspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node {} stats:", self.id)?;
        writeln!(f, "\tLookups: {}", self.lookups)?;
        writeln!(f, "\tStabilization: {}", self.stabilizations)?;
        writeln!(f, "\tFinger fixes: {}", self.finger_fixes)?;
        match self.join_time {
            Some(t) => writeln!(f, "\tJoining time: {}", t.to_rfc2822()),
            None => writeln!(f, "\tJoining time: None"),
        }
    }
}
