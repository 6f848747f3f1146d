//! Top-of-book spread evaluation for one buy/sell venue direction.

use rust_decimal::Decimal;

use super::book::OrderBook;
use super::id::{BookKey, Symbol, VenueId};
use super::money::{fraction_to_percent, FeeRate, Price};

/// Which sequence a direction qualifies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Taker profit after fees beats the taker threshold.
    Taker,
    /// Spread beats the maker threshold but taker profit does not.
    Maker,
}

/// Thresholds in percentage points, matching [`Direction::spread_pct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub taker_pct: Decimal,
    pub maker_pct: Decimal,
}

/// Buying on one venue and selling the same symbol on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Direction {
    pub buy: BookKey,
    pub sell: BookKey,
    pub best_ask_buy: Price,
    pub best_bid_sell: Price,
    pub spread_pct: Decimal,
    pub taker_profit_pct: Decimal,
}

impl Direction {
    /// Price the direction from the buy venue's best ask and the sell
    /// venue's best bid. `None` if either side is empty or the ask is not
    /// positive.
    #[must_use]
    pub fn evaluate(
        buy: &BookKey,
        buy_book: &OrderBook,
        sell: &BookKey,
        sell_book: &OrderBook,
        taker_fee_buy: FeeRate,
        taker_fee_sell: FeeRate,
    ) -> Option<Self> {
        let best_ask_buy = buy_book.best_ask()?.price();
        let best_bid_sell = sell_book.best_bid()?.price();
        if best_ask_buy <= Decimal::ZERO {
            return None;
        }

        let spread_pct = (best_bid_sell - best_ask_buy) / best_ask_buy * Decimal::ONE_HUNDRED;
        let taker_profit_pct = spread_pct - fraction_to_percent(taker_fee_buy + taker_fee_sell);

        Some(Self {
            buy: buy.clone(),
            sell: sell.clone(),
            best_ask_buy,
            best_bid_sell,
            spread_pct,
            taker_profit_pct,
        })
    }

    /// Classify exclusively: a taker candidate is never also a maker candidate.
    #[must_use]
    pub fn signal(&self, thresholds: Thresholds) -> Option<Signal> {
        if self.taker_profit_pct > thresholds.taker_pct {
            Some(Signal::Taker)
        } else if self.spread_pct > thresholds.maker_pct {
            Some(Signal::Maker)
        } else {
            None
        }
    }

    #[must_use]
    pub fn buy_venue(&self) -> &VenueId {
        &self.buy.venue
    }

    #[must_use]
    pub fn sell_venue(&self) -> &VenueId {
        &self.sell.venue
    }

    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.buy.symbol
    }
}
