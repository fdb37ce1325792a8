//! Params of the rpc methods. Every request is sent as a JSON object.
#![allow(missing_docs)]

use chordring_core::dht::Id;
use serde::Deserialize;
use serde::Serialize;

/// For methods without params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRequest {}

/// findSuccessor, getInformation, removeInformation, lookup, getInfo, removeInfo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: Id,
}

/// setSuccessor, notify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub id: Id,
}

/// setPredecessor, `null` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPredecessorRequest {
    #[serde(default)]
    pub predecessor: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFingerTableRequest {
    pub s: Id,
    pub index: usize,
}

/// addInformation, createInfo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationRequest {
    pub key: Id,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        assert_eq!(serde_json::to_string(&EmptyRequest {}).unwrap(), "{}");
        assert_eq!(
            serde_json::to_string(&SetPredecessorRequest { predecessor: None }).unwrap(),
            r#"{"predecessor":null}"#
        );
        let req: SetPredecessorRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.predecessor, None);
        let req: UpdateFingerTableRequest =
            serde_json::from_str(r#"{"s":12,"index":3}"#).unwrap();
        assert_eq!(req.s, Id::new(12));
        assert_eq!(req.index, 3);
    }
}
