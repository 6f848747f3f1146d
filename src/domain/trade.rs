//! Order vocabulary and the two-legged maker trade state machine.
//!
//! A [`MakerTrade`] lives only while it is `Placing` or `Active`. The
//! terminal outcomes (completed, chased, reset) are decisions returned by
//! [`MakerTrade::queue_jump`] and [`MakerTrade::assess`]; acting on them and
//! dropping the trade is the engine's job.

use std::fmt;
use std::time::{Duration, Instant};

use rust_decimal::{Decimal, RoundingStrategy};

use super::book::OrderBook;
use super::id::{OrderId, Symbol, VenueId};
use super::money::{Price, Volume};

/// Decimal places kept on order amounts.
const AMOUNT_DP: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// Venue-reported order status. `Closed` means fully filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Closed,
}

/// Acknowledgement returned when an order is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub id: OrderId,
    pub status: OrderStatus,
    pub price: Price,
    pub amount: Volume,
}

/// Current state of an order as fetched from the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderState {
    pub status: OrderStatus,
    pub price: Price,
    pub amount: Volume,
    pub filled: Volume,
}

impl OrderState {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == OrderStatus::Closed
    }
}

/// One resting order of a maker trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub order_id: OrderId,
    pub side: OrderSide,
    pub price: Price,
    pub amount: Volume,
    pub venue: VenueId,
    pub symbol: Symbol,
}

/// Why a maker quote was not placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteRejection {
    /// A side needed for pricing is empty.
    MissingDepth,
    /// Our bid would not sit below our ask.
    Crossed { buy: Price, sell: Price },
    /// Our bid would take the buy venue's ask.
    BuyWouldTake { ours: Price, best_ask: Price },
    /// Our ask would take the sell venue's bid.
    SellWouldTake { ours: Price, best_bid: Price },
    /// Notional too small for a non-zero amount.
    ZeroAmount,
}

impl fmt::Display for QuoteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDepth => f.write_str("missing depth"),
            Self::Crossed { buy, sell } => write!(f, "quote crossed: buy {buy} >= sell {sell}"),
            Self::BuyWouldTake { ours, best_ask } => {
                write!(f, "buy {ours} would take ask {best_ask}")
            }
            Self::SellWouldTake { ours, best_bid } => {
                write!(f, "sell {ours} would take bid {best_bid}")
            }
            Self::ZeroAmount => f.write_str("amount rounds to zero"),
        }
    }
}

/// Prices and size for a pair of post-only orders one tick inside the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakerQuote {
    pub buy_price: Price,
    pub sell_price: Price,
    pub amount: Volume,
}

impl MakerQuote {
    /// Quote one tick above the buy venue's best bid and one tick below the
    /// sell venue's best ask, sized to `max_notional` at our buy price.
    ///
    /// # Errors
    ///
    /// Rejects quotes that are crossed or that would execute immediately
    /// against either venue's live book.
    pub fn from_books(
        buy_book: &OrderBook,
        sell_book: &OrderBook,
        tick: Price,
        max_notional: Decimal,
    ) -> Result<Self, QuoteRejection> {
        let (Some(buy_bid), Some(buy_ask), Some(sell_bid), Some(sell_ask)) = (
            buy_book.best_bid(),
            buy_book.best_ask(),
            sell_book.best_bid(),
            sell_book.best_ask(),
        ) else {
            return Err(QuoteRejection::MissingDepth);
        };

        let buy_price = buy_bid.price() + tick;
        let sell_price = sell_ask.price() - tick;

        if buy_price >= sell_price {
            return Err(QuoteRejection::Crossed {
                buy: buy_price,
                sell: sell_price,
            });
        }
        if buy_price >= buy_ask.price() {
            return Err(QuoteRejection::BuyWouldTake {
                ours: buy_price,
                best_ask: buy_ask.price(),
            });
        }
        if sell_price <= sell_bid.price() {
            return Err(QuoteRejection::SellWouldTake {
                ours: sell_price,
                best_bid: sell_bid.price(),
            });
        }

        let amount = max_notional
            .checked_div(buy_price)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(AMOUNT_DP, RoundingStrategy::ToZero);
        if amount <= Decimal::ZERO {
            return Err(QuoteRejection::ZeroAmount);
        }

        Ok(Self {
            buy_price,
            sell_price,
            amount,
        })
    }
}

/// Lifecycle of a live maker trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakerStatus {
    /// Orders are being submitted.
    Placing,
    /// Both legs rest on their venues.
    Active { buy_leg: Leg, sell_leg: Leg },
}

/// Evidence that a competitor now quotes better than one of our legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueJump {
    pub side: OrderSide,
    pub ours: Price,
    pub competing: Price,
}

/// What the monitor should do with an active trade after a fill check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakerCheck {
    /// Both legs filled.
    Completed,
    /// One leg filled; replace the other aggressively.
    Chase { open: Leg, filled: Volume },
    /// Neither leg filled within the timeout.
    TimedOut,
    /// Keep waiting.
    Pending,
}

/// A two-legged passive arbitrage attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakerTrade {
    pub buy_venue: VenueId,
    pub sell_venue: VenueId,
    pub symbol: Symbol,
    pub quote: MakerQuote,
    pub created_at: Instant,
    pub status: MakerStatus,
}

impl MakerTrade {
    #[must_use]
    pub fn placing(
        buy_venue: VenueId,
        sell_venue: VenueId,
        symbol: Symbol,
        quote: MakerQuote,
        now: Instant,
    ) -> Self {
        Self {
            buy_venue,
            sell_venue,
            symbol,
            quote,
            created_at: now,
            status: MakerStatus::Placing,
        }
    }

    /// Move to `Active` once both orders are acknowledged.
    pub fn activate(&mut self, buy_id: OrderId, sell_id: OrderId, now: Instant) {
        let buy_leg = Leg {
            order_id: buy_id,
            side: OrderSide::Buy,
            price: self.quote.buy_price,
            amount: self.quote.amount,
            venue: self.buy_venue.clone(),
            symbol: self.symbol.clone(),
        };
        let sell_leg = Leg {
            order_id: sell_id,
            side: OrderSide::Sell,
            price: self.quote.sell_price,
            amount: self.quote.amount,
            venue: self.sell_venue.clone(),
            symbol: self.symbol.clone(),
        };
        self.created_at = now;
        self.status = MakerStatus::Active { buy_leg, sell_leg };
    }

    #[must_use]
    pub fn legs(&self) -> Option<(&Leg, &Leg)> {
        match &self.status {
            MakerStatus::Active { buy_leg, sell_leg } => Some((buy_leg, sell_leg)),
            MakerStatus::Placing => None,
        }
    }

    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Compare our legs against the current competing best prices.
    ///
    /// A strictly better competing bid on the buy venue, or a strictly lower
    /// competing ask on the sell venue, means we lost queue priority. An
    /// empty side is not a jump.
    #[must_use]
    pub fn queue_jump(
        &self,
        best_bid_buy_venue: Option<Price>,
        best_ask_sell_venue: Option<Price>,
    ) -> Option<QueueJump> {
        let (buy_leg, sell_leg) = self.legs()?;

        if let Some(bid) = best_bid_buy_venue.filter(|bid| *bid > buy_leg.price) {
            return Some(QueueJump {
                side: OrderSide::Buy,
                ours: buy_leg.price,
                competing: bid,
            });
        }
        if let Some(ask) = best_ask_sell_venue.filter(|ask| *ask < sell_leg.price) {
            return Some(QueueJump {
                side: OrderSide::Sell,
                ours: sell_leg.price,
                competing: ask,
            });
        }
        None
    }

    /// Decide the next step from both legs' fetched states.
    #[must_use]
    pub fn assess(
        &self,
        buy_state: &OrderState,
        sell_state: &OrderState,
        now: Instant,
        timeout: Duration,
    ) -> MakerCheck {
        let Some((buy_leg, sell_leg)) = self.legs() else {
            return MakerCheck::Pending;
        };

        match (buy_state.is_closed(), sell_state.is_closed()) {
            (true, true) => MakerCheck::Completed,
            (true, false) => MakerCheck::Chase {
                open: sell_leg.clone(),
                filled: sell_state.filled,
            },
            (false, true) => MakerCheck::Chase {
                open: buy_leg.clone(),
                filled: buy_state.filled,
            },
            (false, false) if self.age(now) > timeout => MakerCheck::TimedOut,
            (false, false) => MakerCheck::Pending,
        }
    }
}

/// Aggressive replacement for the unfilled leg of a half-filled trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaseOrder {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub price: Price,
    pub amount: Volume,
}

impl ChaseOrder {
    /// Price the remainder of `open` through its own price by `offset`
    /// (a fraction): sells go lower, buys go higher.
    #[must_use]
    pub fn for_leg(open: &Leg, filled: Volume, offset: Decimal) -> Self {
        let price = match open.side {
            OrderSide::Sell => open.price * (Decimal::ONE - offset),
            OrderSide::Buy => open.price * (Decimal::ONE + offset),
        };
        Self {
            venue: open.venue.clone(),
            symbol: open.symbol.clone(),
            side: open.side,
            price,
            amount: (open.amount - filled).max(Decimal::ZERO),
        }
    }
}

/// Process-wide permission to commit capital.
///
/// Closed while a taker execution or maker trade is in flight, then held
/// shut for a cooldown before it reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradingGate {
    #[default]
    Open,
    Closed,
    CoolingDown { until: Instant },
}

impl TradingGate {
    #[must_use]
    pub fn is_open(&self, now: Instant) -> bool {
        match self {
            Self::Open => true,
            Self::Closed => false,
            Self::CoolingDown { until } => now >= *until,
        }
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    pub fn open(&mut self) {
        *self = Self::Open;
    }

    pub fn cool_down(&mut self, now: Instant, cooldown: Duration) {
        *self = Self::CoolingDown {
            until: now + cooldown,
        };
    }
}
