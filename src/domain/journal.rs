//! Trade history entries written to the journal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::{Symbol, VenueId};
use super::money::{Price, Volume};

/// Kind of lifecycle event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    /// Both taker legs were submitted and at least one was accepted.
    TakerExecuted,
    /// A taker sweep stopped before or during submission.
    TakerAborted,
    /// Both maker legs are resting.
    MakerPlaced,
    /// A maker leg was rejected; the surviving leg was cancelled.
    MakerFailed,
    /// Both maker legs filled.
    MakerCompleted,
    /// One maker leg filled and the other was replaced by an aggressive order.
    MakerChased,
    /// A maker trade was cancelled on a queue jump or timeout.
    MakerReset,
}

impl TradeKind {
    /// Stable name stored in the `event_type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TakerExecuted => "TAKER_EXECUTED",
            Self::TakerAborted => "TAKER_ABORTED",
            Self::MakerPlaced => "MAKER_PLACED",
            Self::MakerFailed => "MAKER_FAILED",
            Self::MakerCompleted => "MAKER_COMPLETED",
            Self::MakerChased => "MAKER_CHASED",
            Self::MakerReset => "MAKER_RESET",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::TakerExecuted,
            Self::TakerAborted,
            Self::MakerPlaced,
            Self::MakerFailed,
            Self::MakerCompleted,
            Self::MakerChased,
            Self::MakerReset,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == s)
        .ok_or_else(|| format!("unknown trade kind: {s}"))
    }
}

/// One journal row.
///
/// Every record names a route (buy venue, sell venue, symbol) even when only
/// one leg was involved, so history can be grouped by route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub kind: TradeKind,
    /// Venue the base currency is bought on.
    pub buy_venue: VenueId,
    /// Venue the base currency is sold on.
    pub sell_venue: VenueId,
    pub symbol: Symbol,
    /// Base-currency amount per leg.
    pub volume: Volume,
    /// Limit price of the buy leg.
    pub buy_price: Price,
    /// Limit price of the sell leg.
    pub sell_price: Price,
    /// Net profit in quote currency, after fees. `None` for events that do
    /// not realize anything.
    pub profit_usd: Option<Decimal>,
    /// Net profit as a percentage of the buy cost.
    pub profit_pct: Option<Decimal>,
    /// Free-form context: leg outcomes, abort reasons, order ids.
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Start a record stamped with the current time. Profit and details are
    /// filled in with the builder methods.
    pub fn new(
        kind: TradeKind,
        buy_venue: &VenueId,
        sell_venue: &VenueId,
        symbol: &Symbol,
        volume: Volume,
        buy_price: Price,
        sell_price: Price,
    ) -> Self {
        Self {
            kind,
            buy_venue: buy_venue.clone(),
            sell_venue: sell_venue.clone(),
            symbol: symbol.clone(),
            volume,
            buy_price,
            sell_price,
            profit_usd: None,
            profit_pct: None,
            details: String::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Attach realized profit.
    #[must_use]
    pub fn with_profit(mut self, usd: Decimal, pct: Decimal) -> Self {
        self.profit_usd = Some(usd);
        self.profit_pct = Some(pct);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kind_round_trips_through_its_label() {
        for kind in [TradeKind::TakerExecuted, TradeKind::MakerReset] {
            assert_eq!(kind.as_str().parse::<TradeKind>(), Ok(kind));
        }
        assert!("BOGUS".parse::<TradeKind>().is_err());
    }

    #[test]
    fn builder_sets_profit_and_details() {
        let record = TradeRecord::new(
            TradeKind::TakerExecuted,
            &"a".into(),
            &"b".into(),
            &"BTC/USDT".into(),
            dec!(0.1),
            dec!(100),
            dec!(101),
        )
        .with_profit(dec!(0.08), dec!(0.8))
        .with_details("orders 1, 2");

        assert_eq!(record.profit_usd, Some(dec!(0.08)));
        assert_eq!(record.details, "orders 1, 2");
    }
}
