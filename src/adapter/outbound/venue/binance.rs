//! Binance diff-depth stream (`<symbol>@depth@100ms`).
//!
//! ```json
//! {"e":"depthUpdate","E":1,"s":"BTCUSDT","U":1,"u":2,"b":[["100.0","1.5"]],"a":[["101.0","0"]]}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{parse_side, VenueProtocol};
use crate::domain::book::{BookDelta, DeltaKind};
use crate::domain::id::{Symbol, VenueId};
use crate::error::Result;

#[derive(Debug, Serialize)]
struct BinanceSubscribeMessage {
    method: &'static str,
    params: Vec<String>,
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BinanceMessage {
    Depth(BinanceDepthUpdate),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct BinanceDepthUpdate {
    #[serde(rename = "e")]
    event: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "b")]
    bids: Option<Vec<Vec<String>>>,
    #[serde(rename = "a")]
    asks: Option<Vec<Vec<String>>>,
}

/// Every Binance depth message is a diff, applied as an update.
#[derive(Debug, Default)]
pub struct BinanceProtocol {
    /// `BTCUSDT` -> `BTC/USDT`.
    symbols: HashMap<String, Symbol>,
}

impl BinanceProtocol {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn wire_symbol(symbol: &Symbol) -> String {
        symbol.as_str().replace('/', "").to_uppercase()
    }
}

impl VenueProtocol for BinanceProtocol {
    fn subscribe_messages(&mut self, symbols: &[Symbol]) -> Result<Vec<String>> {
        self.symbols = symbols
            .iter()
            .map(|s| (Self::wire_symbol(s), s.clone()))
            .collect();

        let params = symbols
            .iter()
            .map(|s| format!("{}@depth@100ms", Self::wire_symbol(s).to_lowercase()))
            .collect();
        let message = BinanceSubscribeMessage {
            method: "SUBSCRIBE",
            params,
            id: 1,
        };
        Ok(vec![serde_json::to_string(&message)?])
    }

    fn parse(&self, venue: &VenueId, text: &str) -> Result<Option<BookDelta>> {
        let update = match serde_json::from_str::<BinanceMessage>(text)? {
            BinanceMessage::Depth(update) if update.event == "depthUpdate" => update,
            BinanceMessage::Depth(_) | BinanceMessage::Other(_) => return Ok(None),
        };
        let Some(symbol) = self.symbols.get(&update.symbol) else {
            return Ok(None);
        };

        Ok(Some(BookDelta {
            venue: venue.clone(),
            symbol: symbol.clone(),
            kind: DeltaKind::Update,
            bids: parse_side(update.bids.as_ref())?,
            asks: parse_side(update.asks.as_ref())?,
        }))
    }
}
