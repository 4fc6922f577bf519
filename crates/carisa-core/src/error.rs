use thiserror::Error;

use carisa_discover::DiscoverError;

use crate::{agent::AgentState, health::HealthError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("discovery error: {0}")]
    Discover(#[from] DiscoverError),

    #[error("health listener error: {0}")]
    Health(#[from] HealthError),

    #[error("registration task failed: {0}")]
    RegistrationTask(String),

    #[error("registration has already failed for node {0}")]
    NotRegistered(String),

    #[error("cannot {op} agent in state {state:?}")]
    InvalidState {
        op: &'static str,
        state: AgentState,
    },
}
