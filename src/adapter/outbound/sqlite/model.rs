//! Database rows for the trade journal. Decimals are stored as text so no
//! precision is lost.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::trades;
use crate::domain::id::{Symbol, VenueId};
use crate::domain::journal::{TradeKind, TradeRecord};
use crate::error::{Error, Result};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trades)]
pub struct NewTradeRow {
    pub recorded_at: String,
    pub event_type: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub symbol: String,
    pub volume: String,
    pub buy_price: String,
    pub sell_price: String,
    pub profit_usd: Option<String>,
    pub profit_pct: Option<String>,
    pub details: String,
}

impl From<&TradeRecord> for NewTradeRow {
    fn from(record: &TradeRecord) -> Self {
        Self {
            recorded_at: record.recorded_at.to_rfc3339(),
            event_type: record.kind.as_str().to_string(),
            buy_venue: record.buy_venue.to_string(),
            sell_venue: record.sell_venue.to_string(),
            symbol: record.symbol.to_string(),
            volume: record.volume.to_string(),
            buy_price: record.buy_price.to_string(),
            sell_price: record.sell_price.to_string(),
            profit_usd: record.profit_usd.map(|d| d.to_string()),
            profit_pct: record.profit_pct.map(|d| d.to_string()),
            details: record.details.clone(),
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub id: Option<i32>,
    pub recorded_at: String,
    pub event_type: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub symbol: String,
    pub volume: String,
    pub buy_price: String,
    pub sell_price: String,
    pub profit_usd: Option<String>,
    pub profit_pct: Option<String>,
    pub details: String,
}

impl TradeRow {
    /// Rebuild the domain record.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if a stored column no longer parses.
    pub fn into_record(self) -> Result<TradeRecord> {
        let recorded_at = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|e| Error::Parse(format!("recorded_at '{}': {e}", self.recorded_at)))?
            .with_timezone(&Utc);

        Ok(TradeRecord {
            kind: self.event_type.parse::<TradeKind>().map_err(Error::Parse)?,
            buy_venue: VenueId::from(self.buy_venue),
            sell_venue: VenueId::from(self.sell_venue),
            symbol: Symbol::from(self.symbol),
            volume: decimal(&self.volume)?,
            buy_price: decimal(&self.buy_price)?,
            sell_price: decimal(&self.sell_price)?,
            profit_usd: self.profit_usd.as_deref().map(decimal).transpose()?,
            profit_pct: self.profit_pct.as_deref().map(decimal).transpose()?,
            details: self.details,
            recorded_at,
        })
    }
}

fn decimal(raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|e| Error::Parse(format!("stored decimal '{raw}': {e}")))
}
