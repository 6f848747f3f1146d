//! OKX `books` channel.
//!
//! The first message after subscribing is a full snapshot, later ones are
//! incremental. Levels carry four fields; only price and size are used.
//!
//! ```json
//! {"arg":{"channel":"books","instId":"BTC-USDT"},"action":"snapshot",
//!  "data":[{"asks":[["101.0","2","0","1"]],"bids":[["100.0","1","0","3"]],"ts":"1"}]}
//! ```

use serde::{Deserialize, Serialize};

use super::{parse_side, VenueProtocol};
use crate::domain::book::{BookDelta, DeltaKind};
use crate::domain::id::{Symbol, VenueId};
use crate::error::Result;

#[derive(Debug, Serialize)]
struct OkxSubscribeMessage {
    op: &'static str,
    args: Vec<OkxArg>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxArg {
    channel: String,
    inst_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OkxMessage {
    Book(OkxBookMessage),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct OkxBookMessage {
    arg: OkxArg,
    #[serde(default)]
    action: Option<String>,
    data: Vec<OkxBookData>,
}

#[derive(Debug, Deserialize)]
struct OkxBookData {
    bids: Option<Vec<Vec<String>>>,
    asks: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Default)]
pub struct OkxProtocol;

impl OkxProtocol {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl VenueProtocol for OkxProtocol {
    fn subscribe_messages(&mut self, symbols: &[Symbol]) -> Result<Vec<String>> {
        let args = symbols
            .iter()
            .map(|s| OkxArg {
                channel: "books".into(),
                inst_id: s.as_str().replace('/', "-"),
            })
            .collect();
        let message = OkxSubscribeMessage {
            op: "subscribe",
            args,
        };
        Ok(vec![serde_json::to_string(&message)?])
    }

    fn parse(&self, venue: &VenueId, text: &str) -> Result<Option<BookDelta>> {
        let OkxMessage::Book(message) = serde_json::from_str::<OkxMessage>(text)? else {
            return Ok(None);
        };
        let Some(data) = message.data.first() else {
            return Ok(None);
        };
        let kind = match message.action.as_deref() {
            Some("snapshot") => DeltaKind::Snapshot,
            _ => DeltaKind::Update,
        };

        Ok(Some(BookDelta {
            venue: venue.clone(),
            symbol: Symbol::from(message.arg.inst_id.replace('-', "/")),
            kind,
            bids: parse_side(data.bids.as_ref())?,
            asks: parse_side(data.asks.as_ref())?,
        }))
    }
}
