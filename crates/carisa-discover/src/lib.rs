mod address;
pub use address::health_address;

mod config;
pub use config::DiscoveryConfig;

mod consul;
pub use consul::ConsulDiscovery;

mod discovery;
pub use discovery::Discovery;

mod errors;
pub use errors::DiscoverError;

mod memory;
pub use memory::MemoryDiscovery;

mod registration;
pub use registration::{Check, Registration, ServiceRecord};
