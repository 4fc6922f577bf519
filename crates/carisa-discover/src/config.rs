use serde::{Deserialize, Serialize};

/// Where the discovery directory lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// Agent endpoint (`host:port` or URL). Empty means the local default.
    pub server: String,
    /// ACL token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
