//! Risk limits.

use rust_decimal::Decimal;
use serde::Deserialize;

/// `[risk]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Largest quote-currency notional committed by one trade.
    #[serde(default = "default_max_trade_notional")]
    pub max_trade_notional: Decimal,
}

fn default_max_trade_notional() -> Decimal {
    Decimal::from(15)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_trade_notional: default_max_trade_notional(),
        }
    }
}
