//! Public depth feeds for the supported venues.
//!
//! Each venue differs only in its subscribe frames and payload shape, so a
//! venue is a [`VenueProtocol`] plugged into the shared websocket loop in
//! [`WsFeed`].

mod binance;
mod okx;
mod stream;

pub use binance::BinanceProtocol;
pub use okx::OkxProtocol;
pub use stream::WsFeed;

use rust_decimal::Decimal;

use crate::domain::book::{BookDelta, PriceLevel};
use crate::domain::id::{Symbol, VenueId};
use crate::error::{Error, Result};

/// Wire format of one venue's depth channel.
pub trait VenueProtocol: Send + Sync {
    /// Frames to send after connecting, remembering the symbols so payloads
    /// can be mapped back.
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be serialized.
    fn subscribe_messages(&mut self, symbols: &[Symbol]) -> Result<Vec<String>>;

    /// Normalize one text frame. Acks and other non-depth frames are
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a depth frame carries unparsable numbers.
    fn parse(&self, venue: &VenueId, text: &str) -> Result<Option<BookDelta>>;
}

/// Parse `[price, size, ...]` rows. Extra fields are ignored.
fn parse_levels(rows: &[Vec<String>]) -> Result<Vec<PriceLevel>> {
    rows.iter()
        .map(|row| match row.as_slice() {
            [price, size, ..] => Ok(PriceLevel::new(parse_decimal(price)?, parse_decimal(size)?)),
            _ => Err(Error::Parse(format!("price level needs 2 fields, got {}", row.len()))),
        })
        .collect()
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|e| Error::Parse(format!("invalid decimal '{raw}': {e}")))
}

fn parse_side(rows: Option<&Vec<Vec<String>>>) -> Result<Option<Vec<PriceLevel>>> {
    rows.map(|rows| parse_levels(rows)).transpose()
}
