use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log encoding {0:?} (expected console, text, json or journald)")]
    InvalidFormat(String),
    #[error("journald logging is not available in this build")]
    JournaldNotSupported,
    #[error("a global logger is already installed")]
    AlreadyInitialized(#[from] TryInitError),
    #[error("cannot connect to journald")]
    Journald(#[source] std::io::Error),
    #[error("invalid log level {level:?}")]
    InvalidLogLevel {
        level: String,
        #[source]
        source: ParseError,
    },
}
