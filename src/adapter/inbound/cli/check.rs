//! Handler for the `check` command.

use std::path::Path;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file and print what it would run.
pub fn execute(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    let venues: Vec<String> = config
        .venues
        .iter()
        .map(|v| format!("{} ({:?})", v.name, v.kind))
        .collect();
    output::field("Venues", venues.join(", "));
    output::field("Symbols", config.feed.symbols.join(", "));
    output::field("Taker edge", format!("{}%", config.strategy.taker_threshold_pct));
    output::field("Maker edge", format!("{}%", config.strategy.maker_threshold_pct));
    output::field("Max notional", config.risk.max_trade_notional);
    output::field("Database", &config.database);

    if config.telegram.enabled {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").is_ok();
        let chat = std::env::var("TELEGRAM_CHAT_ID").is_ok();
        if token && chat {
            output::success("Telegram integration configured");
        } else {
            output::warning("Telegram enabled but environment variables are missing");
            if !token {
                output::field("Missing", "TELEGRAM_BOT_TOKEN");
            }
            if !chat {
                output::field("Missing", "TELEGRAM_CHAT_ID");
            }
        }
    } else {
        output::field("Telegram", "disabled");
    }

    Ok(())
}
