mod error;
pub use error::ConfigError;

mod source;
pub use source::{ConfigSource, MASTER_CONFIG_ENV, WORKER_CONFIG_ENV};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use carisa_discover::DiscoveryConfig;
use carisa_model::{HealthPolicy, NodeDescriptor, NodeType};
use carisa_observe::LogConfig;

pub const MASTER_PORT: u16 = 52422;
pub const WORKER_PORT: u16 = 62422;

/// Full configuration of a node process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Fixed by the entry point; never taken from the input.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub log: LogConfig,
    pub discovery: DiscoveryConfig,
    pub server: ServerConfig,
    pub health: HealthConfig,
    /// Grouping key the node registers under.
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub id: String,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthConfig {
    /// Seconds between probes.
    pub interval: u32,
    /// Seconds before a probe counts as failed.
    pub timeout: u32,
    pub failures_before_critical: u32,
    /// Minutes in critical state before the directory drops the node.
    pub deregister_critical_service_after: u32,
    /// Zero means service port + 1.
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: 10,
            timeout: 1,
            failures_before_critical: 3,
            deregister_critical_service_after: 1,
            port: 0,
        }
    }
}

impl NodeConfig {
    /// Unresolved role defaults: no id, health port still unset.
    pub fn defaults(node_type: NodeType) -> Self {
        let (port, namespace) = match node_type {
            NodeType::Master => (MASTER_PORT, "master"),
            NodeType::Worker => (WORKER_PORT, ""),
        };
        Self {
            node_type,
            log: LogConfig::default(),
            discovery: DiscoveryConfig::default(),
            server: ServerConfig {
                id: String::new(),
                address: "localhost".to_string(),
                port,
            },
            health: HealthConfig::default(),
            namespace: namespace.to_string(),
        }
    }

    /// Read `source` and overlay it on the role defaults.
    pub fn load(node_type: NodeType, source: &ConfigSource) -> Result<Self, ConfigError> {
        let raw = source.read()?;
        Self::from_json(node_type, raw.as_deref(), &source.to_string())
    }

    /// Overlay `raw` (if any) on the role defaults and resolve derived fields.
    ///
    /// Only keys present in `raw` override defaults; nested objects merge.
    pub fn from_json(
        node_type: NodeType,
        raw: Option<&str>,
        reference: &str,
    ) -> Result<Self, ConfigError> {
        let parse_err = |source: serde_json::Error| ConfigError::Parse {
            reference: reference.to_string(),
            source,
        };

        let mut value = serde_json::to_value(Self::defaults(node_type)).map_err(parse_err)?;
        if let Some(raw) = raw {
            let mut patch: Value = serde_json::from_str(raw).map_err(parse_err)?;
            normalize_aliases(&mut patch);
            merge(&mut value, patch);
        }

        let mut cfg: NodeConfig = serde_json::from_value(value).map_err(parse_err)?;
        cfg.node_type = node_type;
        cfg.resolve();
        Ok(cfg)
    }

    fn resolve(&mut self) {
        if self.server.id.is_empty() {
            self.server.id = uuid::Uuid::new_v4().to_string();
        }
        if self.health.port == 0 {
            self.health.port = self.server.port.checked_add(1).unwrap_or(0);
        }
    }

    pub fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new(
            self.server.id.clone(),
            self.node_type,
            self.server.address.clone(),
            self.server.port,
            self.namespace.clone(),
        )
    }

    pub fn health_policy(&self) -> HealthPolicy {
        HealthPolicy {
            interval_secs: self.health.interval,
            timeout_secs: self.health.timeout,
            failures_before_critical: self.health.failures_before_critical,
            deregister_after_minutes: self.health.deregister_critical_service_after,
            port: self.health.port,
        }
    }

    /// Compact JSON rendering for the startup log line. Secrets are masked.
    pub fn to_json(&self) -> String {
        let mut shown = self.clone();
        if shown.discovery.token.is_some() {
            shown.discovery.token = Some("***".to_string());
        }
        serde_json::to_string(&shown).unwrap_or_default()
    }
}

/// Older configs call the grouping key `graphId` or `name`.
fn normalize_aliases(patch: &mut Value) {
    let Value::Object(map) = patch else {
        return;
    };
    map.remove("type");
    for alias in ["graphId", "name"] {
        if let Some(v) = map.remove(alias) {
            map.entry("namespace").or_insert(v);
        }
    }
}

fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (k, v) in patch {
                merge(base.entry(k).or_insert(Value::Null), v);
            }
        }
        (base, patch) => *base = patch,
    }
}
