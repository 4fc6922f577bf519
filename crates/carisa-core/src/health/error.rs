use std::io;

use thiserror::Error;

use crate::health::HealthState;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("health listener cannot resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("health listener cannot listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("health listener cannot run from state {0:?}")]
    InvalidState(HealthState),
}
