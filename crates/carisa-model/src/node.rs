use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a node plays in the cluster.
///
/// The role is attached to the directory registration as its only tag,
/// so clients can filter masters from workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Master,
    Worker,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Master => "master",
            NodeType::Worker => "worker",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved identity of this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// Registration key; generated once per process.
    pub id: String,
    pub node_type: NodeType,
    /// Address the primary service is reachable at.
    pub address: String,
    /// Port of the primary service.
    pub port: u16,
    /// Grouping key the node registers under (worker pool, graph, ...).
    pub group: String,
}

impl NodeDescriptor {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        address: impl Into<String>,
        port: u16,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            address: address.into(),
            port,
            group: group.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_as_tag() {
        assert_eq!(NodeType::Master.as_str(), "master");
        assert_eq!(NodeType::Worker.to_string(), "worker");
    }

    #[test]
    fn node_type_serde_lowercase() {
        let json = serde_json::to_string(&NodeType::Worker).unwrap();
        assert_eq!(json, r#""worker""#);

        let back: NodeType = serde_json::from_str(r#""master""#).unwrap();
        assert_eq!(back, NodeType::Master);
    }

    #[test]
    fn descriptor_camel_case() {
        let node = NodeDescriptor::new("n1", NodeType::Worker, "127.0.0.1", 9000, "ns");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["nodeType"], "worker");
        assert_eq!(value["port"], 9000);
        assert_eq!(value["group"], "ns");
    }
}
