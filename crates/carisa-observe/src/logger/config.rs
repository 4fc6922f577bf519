use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{error::LoggerError, format::LoggerFormat, log::filter};

/// `log` section of a node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Human-oriented output: targets, source locations, colour on a terminal.
    pub development: bool,
    /// `EnvFilter` directive; empty means `debug` in development, `info` otherwise.
    pub level: String,
    /// `console`, `json` or `journald`.
    pub encoding: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            development: true,
            level: "debug".to_string(),
            encoding: "console".to_string(),
        }
    }
}

/// Subscriber settings resolved from a [`LogConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub with_source: bool,
    pub use_color: bool,
}

impl LoggerConfig {
    /// Resolve the node's `log` section against the current stdout.
    ///
    /// Encoding and level are validated here, so a bad section fails
    /// before any subscriber is installed.
    pub fn from_node_log(log: &LogConfig) -> Result<Self, LoggerError> {
        Self::resolve(log, std::io::stdout().is_terminal())
    }

    fn resolve(log: &LogConfig, terminal: bool) -> Result<Self, LoggerError> {
        let format: LoggerFormat = log.encoding.parse()?;
        let level = match log.level.trim() {
            "" if log.development => "debug",
            "" => "info",
            level => level,
        };
        filter(level)?;

        let dev = log.development;
        Ok(Self {
            format,
            level: level.to_string(),
            with_targets: dev,
            with_source: dev,
            use_color: dev && terminal && format == LoggerFormat::Text,
        })
    }
}
