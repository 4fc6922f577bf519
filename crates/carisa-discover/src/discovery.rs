use async_trait::async_trait;
use carisa_model::{HealthPolicy, NodeDescriptor};

use crate::errors::DiscoverError;

/// Registration capability of a discovery directory.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Create or overwrite the record keyed by `node.id` under `name`,
    /// with a TCP check against the node's health listener.
    async fn register(
        &self,
        node: &NodeDescriptor,
        health: &HealthPolicy,
        name: &str,
    ) -> Result<(), DiscoverError>;

    /// Remove the record keyed by `id`.
    async fn deregister(&self, id: &str) -> Result<(), DiscoverError>;
}
