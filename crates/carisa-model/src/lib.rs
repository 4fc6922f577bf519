mod node;
pub use node::{NodeDescriptor, NodeType};

mod health;
pub use health::HealthPolicy;
