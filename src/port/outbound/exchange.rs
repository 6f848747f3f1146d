//! Venue ports: streaming depth in, orders and balances out.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::book::BookDelta;
use crate::domain::id::{OrderId, Symbol, VenueId};
use crate::domain::money::{FeeRate, Price, Volume};
use crate::domain::trade::{OrderAck, OrderSide, OrderState};
use crate::error::Error;

/// Maker and taker fee rates for a venue, as decimal fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Rate charged on resting orders that get filled.
    pub maker: FeeRate,
    /// Rate charged on orders that execute against resting liquidity.
    pub taker: FeeRate,
}

impl FeeSchedule {
    /// Same rate for both sides.
    #[must_use]
    pub const fn flat(rate: FeeRate) -> Self {
        Self {
            maker: rate,
            taker: rate,
        }
    }
}

/// Parameters of a limit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitOrder {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Base-currency amount.
    pub amount: Volume,
    /// Worst acceptable price: the highest for a buy, the lowest for a sell.
    pub price: Price,
    /// Reject instead of executing against resting liquidity.
    pub post_only: bool,
}

/// Order placement, cancellation and account queries against venues.
///
/// Every call returns an explicit result. Failures are recoverable from the
/// engine's point of view: it aborts or resets the affected trade and keeps
/// running.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Place a limit order. A post-only order that would cross is an error.
    async fn create_limit_order(&self, order: &LimitOrder) -> Result<OrderAck, Error>;

    /// Cancel a resting order. Unknown ids are an error.
    async fn cancel_order(
        &self,
        venue: &VenueId,
        order_id: &OrderId,
        symbol: &Symbol,
    ) -> Result<(), Error>;

    /// Current status and filled amount of an order.
    async fn fetch_order_status(
        &self,
        venue: &VenueId,
        order_id: &OrderId,
        symbol: &Symbol,
    ) -> Result<OrderState, Error>;

    /// Free balance of `currency` on `venue`.
    async fn get_balance(&self, venue: &VenueId, currency: &str) -> Result<Decimal, Error>;

    /// Fee rates for `venue`; fetched once per run by the caller.
    async fn get_fees(&self, venue: &VenueId) -> Result<FeeSchedule, Error>;
}

/// Events received from a venue depth stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    /// A normalized depth message.
    Depth(BookDelta),
    /// The connection dropped.
    Disconnected { reason: String },
}

/// A venue's streaming depth feed.
#[async_trait]
pub trait MarketDataStream: Send {
    /// Open the connection. Calling it again after a disconnect reconnects.
    async fn connect(&mut self) -> Result<(), Error>;

    /// Request depth for `symbols`.
    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), Error>;

    /// Next event, or `None` once the stream has ended.
    async fn next_event(&mut self) -> Option<MarketEvent>;

    fn venue(&self) -> &VenueId;
}
