//! Application configuration loading and validation.
//!
//! [`Config`] aggregates every section of the TOML file. Secrets (the
//! Telegram bot token and chat id) are never read from the file; they come
//! from the environment, typically via `.env`.
//!
//! # Example
//!
//! ```no_run
//! use crossarb::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::logging::LoggingConfig;
use super::pool::{FeedConfig, PoolConfig};
use super::risk::RiskConfig;
use super::strategy::StrategyConfig;
use super::telegram::TelegramAppConfig;
use super::venue::{PaperConfig, VenueConfig};
use crate::application::engine::EngineSettings;
use crate::domain::id::{Symbol, VenueId};
use crate::domain::money::percent_to_fraction;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
    /// SQLite file for the trade journal.
    #[serde(default = "default_database")]
    pub database: String,
    /// How long tasks get to wind down after shutdown is signalled.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_database() -> String {
    "crossarb.db".into()
}

const fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.venues.len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "venues",
                reason: "at least two venues are required".to_string(),
            }
            .into());
        }
        let mut names = HashSet::new();
        for venue in &self.venues {
            if venue.name.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "venues.name" }.into());
            }
            if !names.insert(venue.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "venues.name",
                    reason: format!("duplicate venue '{}'", venue.name),
                }
                .into());
            }
            if let Err(e) = url::Url::parse(venue.ws_url()) {
                return Err(ConfigError::InvalidValue {
                    field: "venues.ws_url",
                    reason: format!("{}: {e}", venue.name),
                }
                .into());
            }
        }

        if self.feed.symbols.is_empty() {
            return Err(ConfigError::MissingField { field: "feed.symbols" }.into());
        }
        for symbol in &self.feed.symbols {
            let valid = symbol
                .split_once('/')
                .is_some_and(|(base, quote)| !base.is_empty() && !quote.is_empty());
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "feed.symbols",
                    reason: format!("'{symbol}' is not in BASE/QUOTE form"),
                }
                .into());
            }
        }
        if self.feed.reconnect_delay_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect_delay_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let strategy = &self.strategy;
        if strategy.taker_threshold_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "taker_threshold_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if strategy.maker_threshold_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "maker_threshold_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if strategy.tick_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "tick_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if strategy.depth_levels == 0 {
            return Err(ConfigError::InvalidValue {
                field: "depth_levels",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if strategy.scan_interval_ms == 0 || strategy.monitor_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intervals",
                reason: "scan and monitor intervals must be greater than 0".to_string(),
            }
            .into());
        }
        if strategy.maker_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maker_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if strategy.chase_offset_pct < Decimal::ZERO || strategy.chase_offset_pct >= Decimal::ONE_HUNDRED {
            return Err(ConfigError::InvalidValue {
                field: "chase_offset_pct",
                reason: "must be between 0 and 100".to_string(),
            }
            .into());
        }
        if strategy.default_fee_pct < Decimal::ZERO || strategy.default_fee_pct >= Decimal::ONE_HUNDRED {
            return Err(ConfigError::InvalidValue {
                field: "default_fee_pct",
                reason: "must be between 0 and 100".to_string(),
            }
            .into());
        }

        if self.risk.max_trade_notional <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "max_trade_notional",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.telegram.min_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        Ok(())
    }

    /// Engine tunables, with percentages converted to fractions where the
    /// engine works in fractions.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let strategy = &self.strategy;
        EngineSettings {
            taker_threshold_pct: strategy.taker_threshold_pct,
            maker_threshold_pct: strategy.maker_threshold_pct,
            max_trade_notional: self.risk.max_trade_notional,
            tick_size: strategy.tick_size,
            depth_levels: strategy.depth_levels,
            cooldown: strategy.cooldown(),
            maker_timeout: strategy.maker_timeout(),
            scan_interval: strategy.scan_interval(),
            monitor_interval: strategy.monitor_interval(),
            chase_offset: percent_to_fraction(strategy.chase_offset_pct),
            default_fee: percent_to_fraction(strategy.default_fee_pct),
        }
    }

    #[must_use]
    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.iter().map(|v| VenueId::from(v.name.as_str())).collect()
    }

    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.feed.symbols.iter().map(|s| Symbol::from(s.as_str())).collect()
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
