use serde::{Deserialize, Serialize};

/// How the directory should probe a node.
///
/// Durations are whole units: `interval_secs`/`timeout_secs` in seconds,
/// `deregister_after_minutes` in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPolicy {
    pub interval_secs: u32,
    pub timeout_secs: u32,
    pub failures_before_critical: u32,
    pub deregister_after_minutes: u32,
    /// Port of the TCP liveness listener.
    pub port: u16,
}

impl HealthPolicy {
    /// Check interval as the directory expects it (`"10s"`).
    pub fn interval(&self) -> String {
        format!("{}s", self.interval_secs)
    }

    /// Check timeout as the directory expects it (`"5s"`).
    pub fn timeout(&self) -> String {
        format!("{}s", self.timeout_secs)
    }

    /// Critical-state reaping delay as the directory expects it (`"1m"`).
    pub fn deregister_after(&self) -> String {
        format!("{}m", self.deregister_after_minutes)
    }
}
