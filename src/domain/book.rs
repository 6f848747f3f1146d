//! Per-venue depth: price levels, incremental deltas and the order book.
//!
//! An [`OrderBook`] keeps bids and asks in ordered maps keyed by price, so
//! best-N queries never sort. A level whose quantity drops to zero (or below)
//! is removed rather than stored.
//!
//! ```
//! use crossarb::domain::book::{OrderBook, PriceLevel};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new();
//! book.update(
//!     &[PriceLevel::new(dec!(100), dec!(1)), PriceLevel::new(dec!(101), dec!(2))],
//!     &[PriceLevel::new(dec!(103), dec!(1))],
//! );
//! book.update(&[PriceLevel::new(dec!(101), dec!(0))], &[]);
//!
//! assert_eq!(book.best_bid().unwrap().price(), dec!(100));
//! assert_eq!(book.top_asks(5).len(), 1);
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::id::{BookKey, Symbol, VenueId};
use super::money::{Price, Volume};

/// A single price level: aggregated quantity at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    price: Price,
    size: Volume,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// Bid and ask depth for one venue and symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    bids: BTreeMap<Price, Volume>,
    asks: BTreeMap<Price, Volume>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from full depth on both sides.
    #[must_use]
    pub fn with_levels(bids: &[PriceLevel], asks: &[PriceLevel]) -> Self {
        let mut book = Self::new();
        book.update(bids, asks);
        book
    }

    /// Apply one message's bid and ask changes.
    ///
    /// A quantity of zero or less removes the level; anything else replaces
    /// the quantity at that price. Callers hold `&mut self` for the whole
    /// call, so readers see either none or all of it.
    pub fn update(&mut self, bids: &[PriceLevel], asks: &[PriceLevel]) {
        apply_side(&mut self.bids, bids);
        apply_side(&mut self.asks, asks);
    }

    /// Discard all depth and load the given levels.
    pub fn replace(&mut self, bids: &[PriceLevel], asks: &[PriceLevel]) {
        self.clear();
        self.update(bids, asks);
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Up to `n` bids, highest price first.
    #[must_use]
    pub fn top_bids(&self, n: usize) -> Vec<PriceLevel> {
        self.bids
            .iter()
            .rev()
            .take(n)
            .map(|(price, size)| PriceLevel::new(*price, *size))
            .collect()
    }

    /// Up to `n` asks, lowest price first.
    #[must_use]
    pub fn top_asks(&self, n: usize) -> Vec<PriceLevel> {
        self.asks
            .iter()
            .take(n)
            .map(|(price, size)| PriceLevel::new(*price, *size))
            .collect()
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids
            .last_key_value()
            .map(|(price, size)| PriceLevel::new(*price, *size))
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks
            .first_key_value()
            .map(|(price, size)| PriceLevel::new(*price, *size))
    }

    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

fn apply_side(side: &mut BTreeMap<Price, Volume>, levels: &[PriceLevel]) {
    for level in levels {
        if level.size <= Decimal::ZERO {
            side.remove(&level.price);
        } else {
            side.insert(level.price, level.size);
        }
    }
}

/// Whether a delta carries full depth or incremental changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Snapshot,
    Update,
}

/// A normalized depth message from a venue feed.
///
/// A side that the venue payload did not carry is `None`. An empty vector
/// means the side was present with no changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDelta {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub kind: DeltaKind,
    pub bids: Option<Vec<PriceLevel>>,
    pub asks: Option<Vec<PriceLevel>>,
}

impl BookDelta {
    pub fn update(
        venue: impl Into<VenueId>,
        symbol: impl Into<Symbol>,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    ) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
            kind: DeltaKind::Update,
            bids: Some(bids),
            asks: Some(asks),
        }
    }

    pub fn snapshot(
        venue: impl Into<VenueId>,
        symbol: impl Into<Symbol>,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    ) -> Self {
        Self {
            kind: DeltaKind::Snapshot,
            ..Self::update(venue, symbol, bids, asks)
        }
    }

    #[must_use]
    pub fn key(&self) -> BookKey {
        BookKey {
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
        }
    }
}
