//! Strategy tuning: thresholds, pricing and timing.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// `[strategy]` section.
///
/// Thresholds and offsets are in percent (`0.1` means 0.1%), the unit
/// operators read on venue fee pages.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Minimum net taker profit after fees, in percent.
    #[serde(default = "default_taker_threshold_pct")]
    pub taker_threshold_pct: Decimal,
    /// Minimum raw spread to start a maker trade, in percent.
    #[serde(default)]
    pub maker_threshold_pct: Decimal,
    /// Price increment used to step one tick inside the book when quoting
    /// maker legs.
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,
    /// Book levels per side fed to the depth walk.
    #[serde(default = "default_depth_levels")]
    pub depth_levels: usize,
    /// Seconds the trading gate stays shut after a trade finishes.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Seconds a maker trade may rest before both legs are cancelled.
    #[serde(default = "default_maker_timeout_secs")]
    pub maker_timeout_secs: u64,
    /// Milliseconds between scans of the book registry.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Milliseconds between checks of an active maker trade.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
    /// How far through the open leg's price a chase order goes, in percent.
    #[serde(default = "default_chase_offset_pct")]
    pub chase_offset_pct: Decimal,
    /// Fee assumed when a venue's fees cannot be fetched, in percent.
    #[serde(default = "default_fee_pct")]
    pub default_fee_pct: Decimal,
}

fn default_taker_threshold_pct() -> Decimal {
    Decimal::new(1, 3) // 0.001%
}

fn default_tick_size() -> Decimal {
    Decimal::new(1, 2)
}

const fn default_depth_levels() -> usize {
    10
}

const fn default_cooldown_secs() -> u64 {
    5
}

const fn default_maker_timeout_secs() -> u64 {
    30
}

const fn default_scan_interval_ms() -> u64 {
    100
}

const fn default_monitor_interval_ms() -> u64 {
    1000
}

fn default_chase_offset_pct() -> Decimal {
    Decimal::ONE
}

fn default_fee_pct() -> Decimal {
    Decimal::new(1, 1) // 0.1%
}

impl StrategyConfig {
    /// Gate cooldown as a [`Duration`].
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Maker timeout as a [`Duration`].
    #[must_use]
    pub fn maker_timeout(&self) -> Duration {
        Duration::from_secs(self.maker_timeout_secs)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            taker_threshold_pct: default_taker_threshold_pct(),
            maker_threshold_pct: Decimal::ZERO,
            tick_size: default_tick_size(),
            depth_levels: default_depth_levels(),
            cooldown_secs: default_cooldown_secs(),
            maker_timeout_secs: default_maker_timeout_secs(),
            scan_interval_ms: default_scan_interval_ms(),
            monitor_interval_ms: default_monitor_interval_ms(),
            chase_offset_pct: default_chase_offset_pct(),
            default_fee_pct: default_fee_pct(),
        }
    }
}
