pub mod agent;
pub use agent::{Agent, AgentState};

pub mod config;
pub use config::{ConfigError, ConfigSource, NodeConfig};

pub mod error;
pub use error::CoreError;

pub mod health;
pub use health::{Health, HealthError, HealthState, TcpHealth};
