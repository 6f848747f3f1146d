//! Shared order books keyed by venue and symbol.
//!
//! Feed tasks write, the strategy engine reads. Books are held behind `Arc`
//! and replaced copy-on-write, so a [`RegistrySnapshot`] is a set of
//! immutable books: it can never observe a half-applied delta, and taking
//! one holds the read lock only long enough to clone the `Arc`s.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::domain::book::{BookDelta, DeltaKind, OrderBook, PriceLevel};
use crate::domain::id::{BookKey, Symbol, VenueId};
use crate::error::MalformedDelta;

/// Thread-safe registry of order books.
pub struct BookRegistry {
    books: RwLock<HashMap<BookKey, Arc<OrderBook>>>,
}

impl BookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Apply an incremental update for one venue and symbol.
    ///
    /// A missing side leaves the book untouched and is logged.
    pub fn apply(
        &self,
        venue: &VenueId,
        symbol: &Symbol,
        bids: Option<&[PriceLevel]>,
        asks: Option<&[PriceLevel]>,
    ) -> Result<(), MalformedDelta> {
        let (bids, asks) = both_sides(venue, symbol, bids, asks)?;
        self.write(BookKey::new(venue.clone(), symbol.clone()), |book| {
            book.update(bids, asks);
        });
        Ok(())
    }

    /// Apply a normalized feed message, snapshot or update.
    pub fn apply_delta(&self, delta: &BookDelta) -> Result<(), MalformedDelta> {
        let (bids, asks) = both_sides(
            &delta.venue,
            &delta.symbol,
            delta.bids.as_deref(),
            delta.asks.as_deref(),
        )?;
        self.write(delta.key(), |book| match delta.kind {
            DeltaKind::Snapshot => book.replace(bids, asks),
            DeltaKind::Update => book.update(bids, asks),
        });
        Ok(())
    }

    fn write(&self, key: BookKey, mutate: impl FnOnce(&mut OrderBook)) {
        let mut books = self.books.write();
        let entry = books.entry(key).or_default();
        mutate(Arc::make_mut(entry));
    }

    /// Immutable view of every book currently known.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            books: self.books.read().clone(),
        }
    }

    /// Current book for one key.
    #[must_use]
    pub fn get(&self, key: &BookKey) -> Option<Arc<OrderBook>> {
        self.books.read().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }
}

impl Default for BookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn both_sides<'a>(
    venue: &VenueId,
    symbol: &Symbol,
    bids: Option<&'a [PriceLevel]>,
    asks: Option<&'a [PriceLevel]>,
) -> Result<(&'a [PriceLevel], &'a [PriceLevel]), MalformedDelta> {
    let missing = match (bids, asks) {
        (Some(bids), Some(asks)) => return Ok((bids, asks)),
        (None, Some(_)) => "bid",
        (Some(_), None) => "ask",
        (None, None) => "bid and ask",
    };
    warn!(venue = %venue, symbol = %symbol, missing, "Dropping malformed delta");
    Err(MalformedDelta {
        venue: venue.to_string(),
        symbol: symbol.to_string(),
        missing,
    })
}

/// Point-in-time set of books taken by the strategy engine.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    books: HashMap<BookKey, Arc<OrderBook>>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn get(&self, key: &BookKey) -> Option<&OrderBook> {
        self.books.get(key).map(Arc::as_ref)
    }

    /// Number of distinct venues with at least one book.
    #[must_use]
    pub fn venue_count(&self) -> usize {
        let mut venues: Vec<&VenueId> = self.books.keys().map(|key| &key.venue).collect();
        venues.sort_unstable();
        venues.dedup();
        venues.len()
    }

    /// Every unordered pair of books that share a symbol on different
    /// venues, in key order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(BookKey, BookKey)> {
        let mut keys: Vec<&BookKey> = self.books.keys().collect();
        keys.sort_unstable();

        let mut pairs = Vec::new();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                if a.symbol == b.symbol && a.venue != b.venue {
                    pairs.push(((*a).clone(), (*b).clone()));
                }
            }
        }
        pairs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lvl(price: rust_decimal::Decimal, size: rust_decimal::Decimal) -> PriceLevel {
        PriceLevel::new(price, size)
    }

    #[test]
    fn first_delta_creates_book() {
        let registry = BookRegistry::new();
        let venue = VenueId::from("binance");
        let symbol = Symbol::from("BTC/USDT");

        let bids = vec![lvl(dec!(100), dec!(1))];

        registry
            .apply(&venue, &symbol, Some(bids.as_slice()), Some(&[][..]))
            .unwrap();

        let book = registry.get(&BookKey::new("binance", "BTC/USDT")).unwrap();
        assert_eq!(book.best_bid().unwrap().price(), dec!(100));
    }

    #[test]
    fn missing_side_leaves_book_untouched() {
        let registry = BookRegistry::new();
        let venue = VenueId::from("binance");
        let symbol = Symbol::from("BTC/USDT");
        let bids = vec![lvl(dec!(100), dec!(1))];
        let asks = vec![lvl(dec!(101), dec!(1))];
        registry
            .apply(&venue, &symbol, Some(bids.as_slice()), Some(asks.as_slice()))
            .unwrap();

        let removal = vec![lvl(dec!(100), dec!(0))];
        let err = registry
            .apply(&venue, &symbol, Some(removal.as_slice()), None)
            .unwrap_err();

        assert_eq!(err.missing, "ask");
        let book = registry.get(&BookKey::new("binance", "BTC/USDT")).unwrap();
        assert_eq!(book.bid_depth(), 1);
    }

    #[test]
    fn malformed_first_delta_creates_nothing() {
        let registry = BookRegistry::new();
        let delta = BookDelta {
            bids: None,
            ..BookDelta::update("okx", "BTC/USDT", vec![], vec![])
        };
        assert!(registry.apply_delta(&delta).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_delta_replaces_depth() {
        let registry = BookRegistry::new();
        registry
            .apply_delta(&BookDelta::update(
                "okx",
                "BTC/USDT",
                vec![lvl(dec!(99), dec!(1))],
                vec![lvl(dec!(101), dec!(1))],
            ))
            .unwrap();
        registry
            .apply_delta(&BookDelta::snapshot("okx", "BTC/USDT", vec![lvl(dec!(98), dec!(2))], vec![]))
            .unwrap();

        let book = registry.get(&BookKey::new("okx", "BTC/USDT")).unwrap();
        assert_eq!(book.top_bids(10), vec![lvl(dec!(98), dec!(2))]);
        assert!(book.top_asks(10).is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let registry = BookRegistry::new();
        let key = BookKey::new("okx", "BTC/USDT");
        registry
            .apply_delta(&BookDelta::update("okx", "BTC/USDT", vec![lvl(dec!(99), dec!(1))], vec![]))
            .unwrap();

        let snapshot = registry.snapshot();
        registry
            .apply_delta(&BookDelta::update("okx", "BTC/USDT", vec![lvl(dec!(99), dec!(0))], vec![]))
            .unwrap();

        assert_eq!(snapshot.get(&key).unwrap().bid_depth(), 1);
        assert_eq!(registry.get(&key).unwrap().bid_depth(), 0);
    }

    #[test]
    fn pairs_match_symbols_across_venues() {
        let registry = BookRegistry::new();
        for (venue, symbol) in [
            ("okx", "BTC/USDT"),
            ("binance", "BTC/USDT"),
            ("kraken", "BTC/USDT"),
            ("binance", "ETH/USDT"),
        ] {
            registry
                .apply_delta(&BookDelta::update(venue, symbol, vec![], vec![]))
                .unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.venue_count(), 3);
        assert_eq!(
            snapshot.pairs(),
            vec![
                (BookKey::new("binance", "BTC/USDT"), BookKey::new("kraken", "BTC/USDT")),
                (BookKey::new("binance", "BTC/USDT"), BookKey::new("okx", "BTC/USDT")),
                (BookKey::new("kraken", "BTC/USDT"), BookKey::new("okx", "BTC/USDT")),
            ]
        );
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let registry = Arc::new(BookRegistry::new());
        let writers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|venue| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 1..=200u32 {
                        let price = rust_decimal::Decimal::from(i);
                        registry
                            .apply_delta(&BookDelta::update(
                                venue,
                                "BTC/USDT",
                                vec![lvl(price, dec!(1))],
                                vec![lvl(price + dec!(1000), dec!(1))],
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            let snapshot = registry.snapshot();
            for key in [BookKey::new("a", "BTC/USDT"), BookKey::new("b", "BTC/USDT")] {
                if let Some(book) = snapshot.get(&key) {
                    // Each message adds one bid and one ask together.
                    assert_eq!(book.bid_depth(), book.ask_depth());
                }
            }
        }

        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(registry.snapshot().get(&BookKey::new("a", "BTC/USDT")).unwrap().bid_depth(), 200);
    }
}
