//! Rpc methods.
#![warn(missing_docs)]

/// supported methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Method {
    /// Successor of a key, routed through the ring
    FindSuccessor,
    /// Current predecessor of the node, also used as a liveness probe
    GetPredecessor,
    /// Overwrite the predecessor of the node
    SetPredecessor,
    /// Overwrite the successor of the node
    SetSuccessor,
    /// Offer a node as the new predecessor
    Notify,
    /// Offer a node for one finger, propagated counter-clockwise
    UpdateFingerTable,
    /// Read from the local store of the node
    GetInformation,
    /// Write to the local store of the node
    AddInformation,
    /// Delete from the local store of the node
    RemoveInformation,
    /// Retrieve pointers, finger table and stored items
    NodeInfo,
    /// Retrieve counters
    NodeStats,
    /// Run one stabilize and fix_fingers pass now
    Stabilize,
    /// Find the owner of a key
    Lookup,
    /// Store a value at the owner of its key
    CreateInfo,
    /// Fetch a value from the owner of its key
    GetInfo,
    /// Delete a value at the owner of its key
    RemoveInfo,
    /// Leave the ring and stop the node
    Leave,
}

impl Method {
    /// Return method's name as `&str`
    pub fn as_str(&self) -> &str {
        match self {
            Method::FindSuccessor => "findSuccessor",
            Method::GetPredecessor => "getPredecessor",
            Method::SetPredecessor => "setPredecessor",
            Method::SetSuccessor => "setSuccessor",
            Method::Notify => "notify",
            Method::UpdateFingerTable => "updateFingerTable",
            Method::GetInformation => "getInformation",
            Method::AddInformation => "addInformation",
            Method::RemoveInformation => "removeInformation",
            Method::NodeInfo => "nodeInfo",
            Method::NodeStats => "nodeStats",
            Method::Stabilize => "stabilize",
            Method::Lookup => "lookup",
            Method::CreateInfo => "createInfo",
            Method::GetInfo => "getInfo",
            Method::RemoveInfo => "removeInfo",
            Method::Leave => "leave",
        }
    }
}

#[allow(clippy::to_string_trait_impl)]
impl ToString for Method {
    fn to_string(&self) -> String {
        self.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::FindSuccessor.as_str(), "findSuccessor");
        assert_eq!(Method::UpdateFingerTable.to_string(), "updateFingerTable");
        assert_eq!(Method::RemoveInformation.as_str(), "removeInformation");
        assert_eq!(Method::RemoveInfo.as_str(), "removeInfo");
    }
}
