//! YAML configuration of a node.
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::time::Duration;

use chordring_core::consts::DEFAULT_ID_BITS;
use chordring_core::consts::DEFAULT_RPC_TIMEOUT_MS;
use chordring_core::consts::DEFAULT_STABILIZE_INTERVAL_SECS;
use chordring_core::dht::Id;
use chordring_core::dht::IdSpace;
use chordring_core::dht::NodeConfig;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:50000";
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:50000";
pub const DEFAULT_CONFIG_PATH: &str = "~/.chordring/config.yaml";
/// Pods of the ring are named `chord-<id>`.
pub const POD_NAME_ENV: &str = "POD_NAME";
pub const POD_NAME_PREFIX: &str = "chord-";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// When absent, the id is taken from `POD_NAME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u64>,
    #[serde(default = "default_id_bits")]
    pub id_bits: u8,
    pub bind_addr: String,
    pub endpoint_url: String,
    /// Seconds between two maintenance passes.
    #[serde(default = "default_stabilize_interval")]
    pub stabilize_interval: u64,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Join through this peer instead of probing `peers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<u64>,
    /// Endpoint url of every peer the node may talk to, by id.
    /// When there is no configuration in the YAML file, it is empty.
    #[serde(default)]
    pub peers: BTreeMap<u64, String>,
}

fn default_id_bits() -> u8 {
    DEFAULT_ID_BITS
}

fn default_stabilize_interval() -> u64 {
    DEFAULT_STABILIZE_INTERVAL_SECS
}

fn default_rpc_timeout_ms() -> u64 {
    DEFAULT_RPC_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: None,
            id_bits: DEFAULT_ID_BITS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            stabilize_interval: DEFAULT_STABILIZE_INTERVAL_SECS,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            bootstrap: None,
            peers: BTreeMap::new(),
        }
    }
}

/// Parse the node id out of a pod name of the form `chord-<id>`.
pub fn node_id_from_pod_name(name: &str) -> Option<u64> {
    name.strip_prefix(POD_NAME_PREFIX)?.parse().ok()
}

impl Config {
    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self).map_err(|_| Error::EncodeError)?;
        Ok(path.to_string_lossy().into_owned())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        serde_yaml::from_reader(f_rdr).map_err(|_| Error::DecodeError)
    }

    /// The configured id, or the one carried by `pod_name`.
    pub fn resolve_node_id(&self, pod_name: Option<&str>) -> Result<Id> {
        let raw = match (self.node_id, pod_name) {
            (Some(id), _) => id,
            (None, Some(name)) => node_id_from_pod_name(name)
                .ok_or_else(|| Error::InvalidNodeId(format!("bad pod name {name}")))?,
            (None, None) => return Err(Error::InvalidNodeId("node id is not set".to_string())),
        };
        let space = IdSpace::new(self.id_bits)?;
        Ok(space.id(raw)?)
    }

    /// Core configuration of the node, with the id resolved from the environment if needed.
    pub fn node_config(&self) -> Result<NodeConfig> {
        let pod_name = std::env::var(POD_NAME_ENV).ok();
        let id = self.resolve_node_id(pod_name.as_deref())?;
        Ok(NodeConfig::new(id, self.id_bits).rpc_timeout(self.rpc_timeout()))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_secs(self.stabilize_interval)
    }

    /// Peer table with ids checked against the identifier space.
    pub fn peer_table(&self) -> Result<BTreeMap<Id, String>> {
        let space = IdSpace::new(self.id_bits)?;
        self.peers
            .iter()
            .map(|(id, url)| Ok((space.id(*id)?, url.clone())))
            .collect()
    }
}
