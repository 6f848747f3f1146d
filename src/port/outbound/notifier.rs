//! Notifier port for operator-facing alerts.
//!
//! Delivery is fire-and-forget: [`Notifier::notify`] must return quickly and
//! must never surface delivery failures to the caller.

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::domain::id::{Symbol, VenueId};
use crate::domain::money::{Price, Volume};

/// Buy/sell venue pair and symbol an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub buy_venue: VenueId,
    pub sell_venue: VenueId,
    pub symbol: Symbol,
}

impl Route {
    pub fn new(buy_venue: &VenueId, sell_venue: &VenueId, symbol: &Symbol) -> Self {
        Self {
            buy_venue: buy_venue.clone(),
            sell_venue: sell_venue.clone(),
            symbol: symbol.clone(),
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Startup {
        venues: Vec<VenueId>,
    },
    Shutdown,
    /// A taker sweep is about to be submitted.
    TakerOpportunity {
        route: Route,
        volume: Volume,
        profit_usd: Decimal,
        profit_pct: Decimal,
    },
    /// A trade attempt stopped before placing orders.
    TradeAborted {
        route: Route,
        reason: String,
    },
    /// An order placement or cancellation failed.
    OrderFailed {
        route: Route,
        reason: String,
    },
    MakerPlaced {
        route: Route,
        buy_price: Price,
        sell_price: Price,
        amount: Volume,
    },
    MakerCompleted {
        route: Route,
        profit_usd: Decimal,
    },
    MakerChasing {
        route: Route,
        venue: VenueId,
        price: Price,
        amount: Volume,
    },
    MakerReset {
        route: Route,
        reason: String,
    },
    /// A supervised task ended and the process is shutting down.
    CriticalFailure {
        task: String,
        reason: String,
    },
}

/// Receives events from the engine and runtime.
///
/// Implementations must be thread-safe and non-blocking; slow delivery
/// belongs on a background task.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);

    /// Stop accepting events. Backends with a delivery task let it finish
    /// what is already queued and exit.
    fn close(&self) {}
}

/// Broadcasts events to every registered notifier.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        self.notify_all(event);
    }

    fn close(&self) {
        for notifier in &self.notifiers {
            notifier.close();
        }
    }
}

/// Discards every event.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// Writes events to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::Startup { venues } => info!(venues = venues.len(), "Engine started"),
            Event::Shutdown => info!("Engine stopped"),
            Event::TakerOpportunity {
                route,
                volume,
                profit_usd,
                profit_pct,
            } => info!(
                buy = %route.buy_venue,
                sell = %route.sell_venue,
                symbol = %route.symbol,
                volume = %volume,
                profit_usd = %profit_usd,
                profit_pct = %profit_pct,
                "Taker opportunity"
            ),
            Event::TradeAborted { route, reason } => warn!(
                buy = %route.buy_venue,
                sell = %route.sell_venue,
                reason = %reason,
                "Trade aborted"
            ),
            Event::OrderFailed { route, reason } => warn!(
                buy = %route.buy_venue,
                sell = %route.sell_venue,
                reason = %reason,
                "Order failed"
            ),
            Event::MakerPlaced {
                route,
                buy_price,
                sell_price,
                amount,
            } => info!(
                buy = %route.buy_venue,
                sell = %route.sell_venue,
                buy_price = %buy_price,
                sell_price = %sell_price,
                amount = %amount,
                "Maker orders placed"
            ),
            Event::MakerCompleted { route, profit_usd } => info!(
                symbol = %route.symbol,
                profit_usd = %profit_usd,
                "Maker trade completed"
            ),
            Event::MakerChasing {
                route,
                venue,
                price,
                amount,
            } => info!(
                symbol = %route.symbol,
                venue = %venue,
                price = %price,
                amount = %amount,
                "Chasing unfilled leg"
            ),
            Event::MakerReset { route, reason } => info!(
                symbol = %route.symbol,
                reason = %reason,
                "Maker trade reset"
            ),
            Event::CriticalFailure { task, reason } => {
                error!(task = %task, reason = %reason, "Critical task failure");
            }
        }
    }
}
