use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read the configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot unmarshal the configuration from {reference}: {source}")]
    Parse {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
}
