//! Worker pool and feed reconnection settings.

use std::time::Duration;

use serde::Deserialize;

/// `[pool]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Profit workers. `0` sizes the pool to the machine.
    #[serde(default)]
    pub workers: usize,
    /// Cores left to the async runtime when sizing automatically.
    #[serde(default = "default_reserved_cores")]
    pub reserved_cores: usize,
}

const fn default_reserved_cores() -> usize {
    1
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            reserved_cores: default_reserved_cores(),
        }
    }
}

/// `[feed]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Symbols streamed from every venue, in `BASE/QUOTE` form.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Fixed wait before each reconnection attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_symbols() -> Vec<String> {
    vec!["BTC/USDT".into()]
}

const fn default_reconnect_delay_secs() -> u64 {
    5
}

impl FeedConfig {
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}
