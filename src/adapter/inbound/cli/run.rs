//! Handler for the `run` command.

use tokio::sync::watch;
use tracing::{info, warn};

use super::command::RunArgs;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::run_with_shutdown;

/// Load the config, apply CLI overrides, and run until Ctrl-C or a
/// critical failure.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config.config)?;
    apply_overrides(&mut config, args);
    config.init_logging();
    info!(config = %args.config.config.display(), "crossarb starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
        let _ = shutdown_tx.send(true);
    });

    run_with_shutdown(config, shutdown_rx).await
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }
    if let Some(database) = &args.database {
        config.database = database.to_string_lossy().into_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::inbound::cli::command::{Cli, Commands};
    use clap::Parser;

    const CONFIG: &str = r#"
[[venues]]
name = "binance"
kind = "binance"

[[venues]]
name = "okx"
kind = "okx"
"#;

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "crossarb",
            "run",
            "--log-level",
            "debug",
            "--json-logs",
            "--database",
            "/tmp/other.db",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = Config::parse_toml(CONFIG).unwrap();
        apply_overrides(&mut config, &args);

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.is_json());
        assert_eq!(config.database, "/tmp/other.db");
    }
}
