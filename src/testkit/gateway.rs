//! In-memory [`ExecutionGateway`] with scriptable failures and fills.
//!
//! Orders are accepted with ids `<venue>-<n>` (one counter across venues)
//! and stay `Open` until a test marks them with
//! [`ScriptedGateway::set_status`]. Every call is recorded so tests can
//! assert on what the engine sent.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::id::{OrderId, Symbol, VenueId};
use crate::domain::trade::{OrderAck, OrderState, OrderStatus};
use crate::error::{Error, ExecutionError};
use crate::port::{ExecutionGateway, FeeSchedule, LimitOrder};

#[derive(Default)]
pub struct ScriptedGateway {
    next_id: AtomicU64,
    status_calls: AtomicUsize,
    rejecting: Mutex<HashSet<VenueId>>,
    failing_cancels: Mutex<bool>,
    order_latency: Mutex<Option<Duration>>,
    orders: Mutex<HashMap<OrderId, (LimitOrder, OrderState)>>,
    created: Mutex<Vec<LimitOrder>>,
    cancelled: Mutex<Vec<OrderId>>,
    balances: Mutex<HashMap<(VenueId, String), Decimal>>,
    fees: Mutex<HashMap<VenueId, FeeSchedule>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every order placed on `venue` from now on.
    pub fn reject_orders_on(&self, venue: &str) {
        self.rejecting.lock().insert(VenueId::from(venue));
    }

    /// Hold every order submission for `latency` before answering.
    pub fn delay_orders(&self, latency: Duration) {
        *self.order_latency.lock() = Some(latency);
    }

    pub fn fail_cancels(&self) {
        *self.failing_cancels.lock() = true;
    }

    pub fn set_balance(&self, venue: &str, currency: &str, amount: Decimal) {
        self.balances
            .lock()
            .insert((VenueId::from(venue), currency.to_string()), amount);
    }

    pub fn set_fees(&self, venue: &str, fees: FeeSchedule) {
        self.fees.lock().insert(VenueId::from(venue), fees);
    }

    /// Mark an order's status and filled amount.
    pub fn set_status(&self, id: &OrderId, status: OrderStatus, filled: Decimal) {
        if let Some((_, state)) = self.orders.lock().get_mut(id) {
            state.status = status;
            state.filled = filled;
        }
    }

    /// Accepted and rejected orders, in submission order.
    pub fn created(&self) -> Vec<LimitOrder> {
        self.created.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionGateway for ScriptedGateway {
    async fn create_limit_order(&self, order: &LimitOrder) -> Result<OrderAck, Error> {
        let latency = *self.order_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.created.lock().push(order.clone());
        if self.rejecting.lock().contains(&order.venue) {
            return Err(ExecutionError::OrderRejected(format!("{} refused", order.venue)).into());
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = OrderId::from(format!("{}-{n}", order.venue));
        let state = OrderState {
            status: OrderStatus::Open,
            price: order.price,
            amount: order.amount,
            filled: Decimal::ZERO,
        };
        self.orders.lock().insert(id.clone(), (order.clone(), state));

        Ok(OrderAck {
            id,
            status: OrderStatus::Open,
            price: order.price,
            amount: order.amount,
        })
    }

    async fn cancel_order(
        &self,
        _venue: &VenueId,
        order_id: &OrderId,
        _symbol: &Symbol,
    ) -> Result<(), Error> {
        if *self.failing_cancels.lock() {
            return Err(ExecutionError::OrderRejected("cancel refused".into()).into());
        }
        self.cancelled.lock().push(order_id.clone());
        Ok(())
    }

    async fn fetch_order_status(
        &self,
        _venue: &VenueId,
        order_id: &OrderId,
        _symbol: &Symbol,
    ) -> Result<OrderState, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .get(order_id)
            .map(|(_, state)| *state)
            .ok_or_else(|| ExecutionError::OrderNotFound(order_id.to_string()).into())
    }

    async fn get_balance(&self, venue: &VenueId, currency: &str) -> Result<Decimal, Error> {
        self.balances
            .lock()
            .get(&(venue.clone(), currency.to_string()))
            .copied()
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
            .lock()
            .get(venue)
            .copied()
            .ok_or_else(|| ExecutionError::UnknownVenue(venue.to_string()).into())
    }
}
