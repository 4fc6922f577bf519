use std::{env, fmt, fs, path::PathBuf};

use carisa_model::NodeType;

use crate::config::ConfigError;

pub const MASTER_CONFIG_ENV: &str = "CARISA_MASTER_CONFIG_JSON";
pub const WORKER_CONFIG_ENV: &str = "CARISA_WORKER_CONFIG_JSON";

/// Where a node reads its JSON configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Env(String),
}

impl ConfigSource {
    /// The given file, else the role's environment variable.
    pub fn for_role(node_type: NodeType, file: Option<PathBuf>) -> Self {
        match file {
            Some(path) if !path.as_os_str().is_empty() => ConfigSource::File(path),
            _ => ConfigSource::Env(default_env(node_type).to_string()),
        }
    }

    /// Raw JSON, or `None` when the environment variable is unset or blank.
    pub fn read(&self) -> Result<Option<String>, ConfigError> {
        match self {
            ConfigSource::File(path) => fs::read_to_string(path)
                .map(Some)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                }),
            ConfigSource::Env(name) => Ok(env::var(name).ok().filter(|v| !v.trim().is_empty())),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "file:{}", path.display()),
            ConfigSource::Env(name) => write!(f, "env:{name}"),
        }
    }
}

fn default_env(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Master => MASTER_CONFIG_ENV,
        NodeType::Worker => WORKER_CONFIG_ENV,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_picks_environment_variable() {
        assert_eq!(
            ConfigSource::for_role(NodeType::Master, None),
            ConfigSource::Env(MASTER_CONFIG_ENV.into())
        );
        assert_eq!(
            ConfigSource::for_role(NodeType::Worker, Some(PathBuf::new())),
            ConfigSource::Env(WORKER_CONFIG_ENV.into())
        );
    }

    #[test]
    fn file_wins_over_environment() {
        let src = ConfigSource::for_role(NodeType::Worker, Some("/etc/carisa/worker.json".into()));
        assert_eq!(src, ConfigSource::File("/etc/carisa/worker.json".into()));
        assert_eq!(src.to_string(), "file:/etc/carisa/worker.json");
    }

    #[test]
    fn missing_file_is_an_error() {
        let src = ConfigSource::File("/nonexistent/carisa/config.json".into());
        assert!(matches!(src.read(), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn unset_variable_reads_nothing() {
        let src = ConfigSource::Env("CARISA_TEST_CONFIG_NOT_DEFINED".into());
        assert!(src.read().unwrap().is_none());
    }
}
