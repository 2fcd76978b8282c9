//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use moveflow_chain::AptosNetwork;

use crate::config::CliConfig;
use crate::output::OutputFormat;

/// MoveFlow payment streams CLI.
#[derive(Parser, Debug)]
#[command(name = "moveflow")]
#[command(author = "MoveFlow Contributors")]
#[command(version)]
#[command(about = "Command-line interface for MoveFlow payment streams on Aptos")]
#[command(
    long_about = "MoveFlow streams tokens from a sender to a recipient over time on Aptos.\n\nRun 'moveflow mcp-server' to expose stream tools to an AI assistant."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Aptos network, overriding the config file.
    #[arg(long, global = true, env = "APTOS_NETWORK")]
    pub network: Option<NetworkArg>,

    /// Full-node URL, overriding the network preset.
    #[arg(long, global = true, env = "APTOS_NODE_URL")]
    pub node_url: Option<String>,

    /// MoveFlow module address, overriding the network preset.
    #[arg(long, global = true, env = "CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Hex-encoded Ed25519 private key used to sign transactions.
    #[arg(long, global = true, env = "APTOS_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
}

impl Cli {
    /// Apply command-line and environment overrides to the file config.
    pub fn apply_overrides(&self, config: &mut CliConfig) {
        if let Some(network) = self.network {
            config.aptos.network = network.into();
        }
        if let Some(url) = self.node_url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.aptos.node_url = Some(url.clone());
        }
        if let Some(addr) = self
            .contract_address
            .as_ref()
            .filter(|a| !a.trim().is_empty())
        {
            config.aptos.contract_address = Some(addr.clone());
        }
    }
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Network argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum NetworkArg {
    /// Aptos mainnet.
    Mainnet,
    /// Aptos testnet.
    Testnet,
}

impl From<NetworkArg> for AptosNetwork {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Mainnet => AptosNetwork::Mainnet,
            NetworkArg::Testnet => AptosNetwork::Testnet,
        }
    }
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start MCP server for AI assistant integration.
    ///
    /// Runs on stdio. Requires APTOS_PRIVATE_KEY.
    McpServer,

    /// Scan the node for every stream record mentioning an address.
    ///
    /// Reports what each event source returned, the stream ids found and
    /// their details. Useful when get_account_streams misses a stream.
    QueryStreams {
        /// Account address to scan.
        address: String,
    },

    /// Show the token balance of an account.
    Balance {
        /// Account address (defaults to the configured account).
        #[arg(short, long)]
        address: Option<String>,

        /// Token shorthand (APT, USDC, USDT) or full coin type.
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Show or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: CompletionShell,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Shell types for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    PowerShell,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
            CompletionShell::PowerShell => clap_complete::Shell::PowerShell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_streams_requires_address() {
        assert!(Cli::try_parse_from(["moveflow", "query-streams"]).is_err());

        let cli = Cli::try_parse_from(["moveflow", "query-streams", "0xa", "--format", "json"])
            .unwrap();
        match cli.command {
            Commands::QueryStreams { address } => assert_eq!(address, "0xa"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(matches!(cli.format, OutputFormatArg::Json));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "moveflow",
            "balance",
            "--network",
            "mainnet",
            "--contract-address",
            "0xfeed",
        ])
        .unwrap();

        let mut config = CliConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.aptos.network, AptosNetwork::Mainnet);
        assert_eq!(config.aptos.contract_address.as_deref(), Some("0xfeed"));
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!(Cli::try_parse_from(["moveflow", "balance", "--network", "devnet"]).is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["moveflow", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
