use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use carisa_model::{HealthPolicy, NodeDescriptor};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    discovery::Discovery,
    errors::DiscoverError,
    registration::{Registration, ServiceRecord},
};

/// In-process directory.
///
/// Applies the same validation as a real directory client; useful for
/// running a node without a directory and for tests.
#[derive(Clone, Default)]
pub struct MemoryDiscovery {
    records: Arc<RwLock<HashMap<String, Registration>>>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, id: &str) -> Option<ServiceRecord> {
        self.records.read().await.get(id).map(ServiceRecord::from)
    }

    /// Full registration body stored for `id`, check included.
    pub async fn registration(&self, id: &str) -> Option<Registration> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Discovery for MemoryDiscovery {
    async fn register(
        &self,
        node: &NodeDescriptor,
        health: &HealthPolicy,
        name: &str,
    ) -> Result<(), DiscoverError> {
        let registration = Registration::new(node, health, name)?;
        self.records
            .write()
            .await
            .insert(registration.id.clone(), registration);

        info!(id = %node.id, name = %name, "server registered in memory directory");
        Ok(())
    }

    async fn deregister(&self, id: &str) -> Result<(), DiscoverError> {
        match self.records.write().await.remove(id) {
            Some(_) => {
                info!(id = %id, "server deregistered from memory directory");
                Ok(())
            }
            None => {
                debug!(id = %id, "deregister for unknown service");
                Err(DiscoverError::Rejected {
                    op: "deregister",
                    status: 404,
                    body: format!("unknown service id {id:?}"),
                })
            }
        }
    }
}
