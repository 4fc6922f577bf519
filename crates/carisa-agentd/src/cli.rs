use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use carisa_model::NodeType;

/// Cluster node agent: registers this node in the discovery directory and
/// answers its TCP health probes until interrupted.
#[derive(Debug, Parser)]
#[command(name = "carisa-agentd", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub role: Role,
}

#[derive(Debug, Subcommand)]
pub enum Role {
    /// Run a master node.
    Master(RoleArgs),
    /// Run a worker node.
    Worker(RoleArgs),
}

#[derive(Debug, Args)]
pub struct RoleArgs {
    /// JSON configuration file. Without it the role's
    /// CARISA_<ROLE>_CONFIG_JSON environment variable is read.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Role {
    pub fn split(self) -> (NodeType, Option<PathBuf>) {
        match self {
            Role::Master(args) => (NodeType::Master, args.config),
            Role::Worker(args) => (NodeType::Worker, args.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn worker_with_config_file() {
        let cli = Cli::try_parse_from(["carisa-agentd", "worker", "--config", "w.json"]).unwrap();
        let (node_type, config) = cli.role.split();
        assert_eq!(node_type, NodeType::Worker);
        assert_eq!(config, Some(PathBuf::from("w.json")));
    }

    #[test]
    fn master_without_config() {
        let cli = Cli::try_parse_from(["carisa-agentd", "master"]).unwrap();
        assert_eq!(cli.role.split(), (NodeType::Master, None));
    }

    #[test]
    fn role_is_required() {
        assert!(Cli::try_parse_from(["carisa-agentd"]).is_err());
    }
}
