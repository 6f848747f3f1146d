//! Venue and paper-trading configuration.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Supported websocket protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// Binance spot diff-depth stream.
    Binance,
    /// OKX v5 public `books` channel.
    Okx,
}

impl VenueKind {
    /// Public endpoint used when a venue sets no `ws_url`.
    #[must_use]
    pub const fn default_ws_url(self) -> &'static str {
        match self {
            Self::Binance => "wss://stream.binance.com:9443/ws",
            Self::Okx => "wss://ws.okx.com:8443/ws/v5/public",
        }
    }
}

/// One `[[venues]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Identifier used in logs, books and the journal.
    pub name: String,
    /// Wire protocol spoken by the feed.
    pub kind: VenueKind,
    /// Overrides the protocol's public endpoint.
    #[serde(default)]
    pub ws_url: Option<String>,
}

impl VenueConfig {
    #[must_use]
    pub fn ws_url(&self) -> &str {
        self.ws_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_ws_url())
    }
}

/// Maker and taker fees for one venue, in percent.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeeConfig {
    /// Charged on resting orders when they fill.
    #[serde(default)]
    pub maker_pct: Decimal,
    /// Charged on orders that cross the book.
    #[serde(default)]
    pub taker_pct: Decimal,
}

/// `[paper]` section: the simulated accounts behind the paper gateway.
///
/// ```toml
/// [paper.balances.binance]
/// USDT = 1000
/// BTC = 0.05
///
/// [paper.fees.binance]
/// maker_pct = 0.1
/// taker_pct = 0.1
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaperConfig {
    /// Starting balances, venue -> currency -> amount.
    #[serde(default)]
    pub balances: HashMap<String, HashMap<String, Decimal>>,
    /// Venues without an entry report no fees, so the engine falls back
    /// to `strategy.default_fee_pct`.
    #[serde(default)]
    pub fees: HashMap<String, FeeConfig>,
}
