//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Cross-venue crypto arbitrage engine
#[derive(Parser, Debug)]
#[command(name = "crossarb")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream books and trade until Ctrl-C
    Run(RunArgs),

    /// Validate a configuration file without connecting anywhere
    Check(ConfigArg),

    /// Show recent journal entries
    Trades(TradesArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArg {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Override the configured log level (e.g. debug, info, warn)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the journal database path
    #[arg(long)]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TradesArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Number of entries to show
    #[arg(short, long, default_value_t = 20)]
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_config_toml() {
        let cli = Cli::parse_from(["crossarb", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.config, PathBuf::from("config.toml"));
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::parse_from([
            "crossarb",
            "run",
            "--config",
            "alt.toml",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.config, PathBuf::from("alt.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
    }

    #[test]
    fn trades_limit_and_global_json() {
        let cli = Cli::parse_from(["crossarb", "trades", "-l", "5", "--json"]);
        assert!(cli.json);
        let Commands::Trades(args) = cli.command else {
            panic!("expected trades");
        };
        assert_eq!(args.limit, 5);
    }
}
