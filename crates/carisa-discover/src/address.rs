use carisa_model::{HealthPolicy, NodeDescriptor};

use crate::errors::DiscoverError;

/// `address:port` of the health listener.
///
/// Shared by the listener bind and the check registered in the directory,
/// so both always point at the same socket.
pub fn health_address(node: &NodeDescriptor, health: &HealthPolicy) -> Result<String, DiscoverError> {
    if node.address.is_empty() || health.port == 0 {
        return Err(DiscoverError::InvalidRegistration(format!(
            "the server address and health port cannot be empty (address={:?}, port={})",
            node.address, health.port
        )));
    }
    Ok(format!("{}:{}", node.address, health.port))
}
