use carisa_model::{HealthPolicy, NodeDescriptor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{address::health_address, errors::DiscoverError};

/// Service registration body, in the directory's own field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Registration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub check: Check,
}

/// TCP health check attached to a [`Registration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Check {
    pub name: String,
    #[serde(rename = "TCP")]
    pub tcp: String,
    pub interval: String,
    pub timeout: String,
    pub failures_before_critical: u32,
    pub deregister_critical_service_after: String,
}

impl Registration {
    /// Validate the inputs and build the body sent to the directory.
    pub fn new(
        node: &NodeDescriptor,
        health: &HealthPolicy,
        name: &str,
    ) -> Result<Self, DiscoverError> {
        if name.is_empty() {
            return Err(DiscoverError::InvalidRegistration(format!(
                "the service name cannot be empty (id={})",
                node.id
            )));
        }
        if node.id.is_empty() {
            return Err(DiscoverError::InvalidRegistration(
                "the node id cannot be empty".to_string(),
            ));
        }
        if node.address.is_empty() || node.port == 0 {
            return Err(DiscoverError::InvalidRegistration(format!(
                "the address and port cannot be empty (id={}, address={:?}, port={})",
                node.id, node.address, node.port
            )));
        }
        let tcp = health_address(node, health)?;

        Ok(Self {
            id: node.id.clone(),
            name: name.to_string(),
            tags: vec![node.node_type.to_string()],
            address: node.address.clone(),
            port: node.port,
            check: Check {
                name: node.id.clone(),
                tcp,
                interval: health.interval(),
                timeout: health.timeout(),
                failures_before_critical: health.failures_before_critical,
                deregister_critical_service_after: health.deregister_after(),
            },
        })
    }
}

/// A registered service as reported back by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub service: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub address: String,
    pub port: u16,
}

fn null_as_empty<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

impl From<&Registration> for ServiceRecord {
    fn from(r: &Registration) -> Self {
        Self {
            id: r.id.clone(),
            service: r.name.clone(),
            tags: r.tags.clone(),
            address: r.address.clone(),
            port: r.port,
        }
    }
}
