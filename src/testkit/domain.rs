//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::book::{BookDelta, PriceLevel};
use crate::port::MarketEvent;

/// Price levels from `(price, size)` pairs.
pub fn levels(raw: &[(Decimal, Decimal)]) -> Vec<PriceLevel> {
    raw.iter()
        .map(|(price, size)| PriceLevel::new(*price, *size))
        .collect()
}

/// Snapshot delta with a single bid and ask of size 10.
pub fn top_of_book(venue: &str, symbol: &str, bid: Decimal, ask: Decimal) -> BookDelta {
    let size = Decimal::TEN;
    BookDelta::snapshot(
        venue,
        symbol,
        vec![PriceLevel::new(bid, size)],
        vec![PriceLevel::new(ask, size)],
    )
}

pub fn depth_event(delta: BookDelta) -> MarketEvent {
    MarketEvent::Depth(delta)
}

pub fn disconnect_event(reason: &str) -> MarketEvent {
    MarketEvent::Disconnected {
        reason: reason.to_string(),
    }
}
