//! Simulated execution against the live books.
//!
//! Orders never leave the process. A crossing order fills at its limit
//! price as soon as it is placed (or rejected, if post-only); a resting
//! order fills whole the first time its status is fetched after the venue's
//! book has traded through its price. Fills move the simulated balances,
//! net of the venue's maker or taker fee.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::registry::BookRegistry;
use crate::domain::id::{BookKey, OrderId, Symbol, VenueId};
use crate::domain::trade::{OrderAck, OrderSide, OrderState, OrderStatus};
use crate::error::{Error, ExecutionError};
use crate::port::{ExecutionGateway, FeeSchedule, LimitOrder};

struct PaperOrder {
    order: LimitOrder,
    state: OrderState,
}

pub struct PaperGateway {
    registry: Arc<BookRegistry>,
    venues: HashSet<VenueId>,
    fees: HashMap<VenueId, FeeSchedule>,
    balances: DashMap<(VenueId, String), Decimal>,
    orders: DashMap<OrderId, PaperOrder>,
}

impl PaperGateway {
    pub fn new(registry: Arc<BookRegistry>, venues: impl IntoIterator<Item = VenueId>) -> Self {
        Self {
            registry,
            venues: venues.into_iter().collect(),
            fees: HashMap::new(),
            balances: DashMap::new(),
            orders: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_balance(self, venue: impl Into<VenueId>, currency: &str, amount: Decimal) -> Self {
        self.balances
            .insert((venue.into(), currency.to_uppercase()), amount);
        self
    }

    #[must_use]
    pub fn with_fees(mut self, venue: impl Into<VenueId>, fees: FeeSchedule) -> Self {
        self.fees.insert(venue.into(), fees);
        self
    }

    /// Would `order` execute against the venue's current book?
    fn crosses(&self, order: &LimitOrder) -> bool {
        let Some(book) = self
            .registry
            .get(&BookKey::new(order.venue.clone(), order.symbol.clone()))
        else {
            return false;
        };
        match order.side {
            OrderSide::Buy => book.best_ask().is_some_and(|ask| ask.price() <= order.price),
            OrderSide::Sell => book.best_bid().is_some_and(|bid| bid.price() >= order.price),
        }
    }

    fn balance(&self, venue: &VenueId, currency: &str) -> Decimal {
        self.balances
            .get(&(venue.clone(), currency.to_string()))
            .map_or(Decimal::ZERO, |b| *b)
    }

    fn adjust(&self, venue: &VenueId, currency: &str, delta: Decimal) {
        *self
            .balances
            .entry((venue.clone(), currency.to_string()))
            .or_insert(Decimal::ZERO) += delta;
    }

    fn fee_rate(&self, venue: &VenueId, taker: bool) -> Decimal {
        self.fees
            .get(venue)
            .map_or(Decimal::ZERO, |f| if taker { f.taker } else { f.maker })
    }

    /// Reject orders the account could not pay for.
    fn check_funds(&self, order: &LimitOrder) -> Result<(), ExecutionError> {
        let (currency, have, need) = match order.side {
            OrderSide::Buy => {
                let quote = order.symbol.quote();
                let cost = order.amount * order.price;
                let need = cost + cost * self.fee_rate(&order.venue, !order.post_only);
                (quote, self.balance(&order.venue, quote), need)
            }
            OrderSide::Sell => {
                let base = order.symbol.base();
                (base, self.balance(&order.venue, base), order.amount)
            }
        };
        if have < need {
            return Err(ExecutionError::OrderRejected(format!(
                "insufficient {currency} on {}: have {have}, need {need}",
                order.venue
            )));
        }
        Ok(())
    }

    fn settle(&self, order: &LimitOrder, taker: bool) {
        let base = order.symbol.base();
        let quote = order.symbol.quote();
        let notional = order.amount * order.price;
        let fee = notional * self.fee_rate(&order.venue, taker);
        match order.side {
            OrderSide::Buy => {
                self.adjust(&order.venue, quote, -(notional + fee));
                self.adjust(&order.venue, base, order.amount);
            }
            OrderSide::Sell => {
                self.adjust(&order.venue, base, -order.amount);
                self.adjust(&order.venue, quote, notional - fee);
            }
        }
        info!(
            venue = %order.venue,
            side = %order.side,
            amount = %order.amount,
            price = %order.price,
            fee = %fee,
            "Paper fill"
        );
    }

    fn known_venue(&self, venue: &VenueId) -> Result<(), ExecutionError> {
        if self.venues.contains(venue) {
            Ok(())
        } else {
            Err(ExecutionError::UnknownVenue(venue.to_string()))
        }
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn create_limit_order(&self, order: &LimitOrder) -> Result<OrderAck, Error> {
        self.known_venue(&order.venue)?;
        if order.amount <= Decimal::ZERO || order.price <= Decimal::ZERO {
            return Err(ExecutionError::OrderRejected("amount and price must be positive".into()).into());
        }

        let crosses = self.crosses(order);
        if crosses && order.post_only {
            return Err(ExecutionError::OrderRejected(format!(
                "post-only {} at {} would cross the book on {}",
                order.side, order.price, order.venue
            ))
            .into());
        }
        self.check_funds(order)?;

        let mut state = OrderState {
            status: OrderStatus::Open,
            price: order.price,
            amount: order.amount,
            filled: Decimal::ZERO,
        };
        if crosses {
            self.settle(order, true);
            state.status = OrderStatus::Closed;
            state.filled = order.amount;
        }

        let id = OrderId::from(format!("paper-{}", Uuid::new_v4()));
        debug!(order = %id, venue = %order.venue, status = ?state.status, "Paper order accepted");
        self.orders.insert(
            id.clone(),
            PaperOrder {
                order: order.clone(),
                state,
            },
        );

        Ok(OrderAck {
            id,
            status: state.status,
            price: order.price,
            amount: order.amount,
        })
    }

    async fn cancel_order(
        &self,
        venue: &VenueId,
        order_id: &OrderId,
        _symbol: &Symbol,
    ) -> Result<(), Error> {
        self.known_venue(venue)?;
        let removed = self
            .orders
            .remove_if(order_id, |_, paper| !paper.state.is_closed());
        if removed.is_none() && !self.orders.contains_key(order_id) {
            return Err(ExecutionError::OrderNotFound(order_id.to_string()).into());
        }
        Ok(())
    }

    async fn fetch_order_status(
        &self,
        venue: &VenueId,
        order_id: &OrderId,
        _symbol: &Symbol,
    ) -> Result<OrderState, Error> {
        self.known_venue(venue)?;
        let mut paper = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ExecutionError::OrderNotFound(order_id.to_string()))?;

        if !paper.state.is_closed() && self.crosses(&paper.order) {
            self.settle(&paper.order, false);
            paper.state.status = OrderStatus::Closed;
            paper.state.filled = paper.state.amount;
        }
        Ok(paper.state)
    }

    async fn get_balance(&self, venue: &VenueId, currency: &str) -> Result<Decimal, Error> {
        self.known_venue(venue)?;
        self.balances
            .get(&(venue.clone(), currency.to_string()))
            .map(|b| *b)
            .ok_or_else(|| {
                ExecutionError::BalanceUnavailable {
                    venue: venue.to_string(),
                    currency: currency.to_string(),
                }
                .into()
            })
    }

    async fn get_fees(&self, venue: &VenueId) -> Result<FeeSchedule, Error> {
        self.fees
            .get(venue)
            .copied()
            .ok_or_else(|| ExecutionError::UnknownVenue(venue.to_string()).into())
    }
}
