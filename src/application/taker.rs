//! Taker sweep: balance verification and the two concurrent legs.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::money::Price;
use crate::domain::profit::ProfitEstimate;
use crate::domain::trade::{OrderAck, OrderSide};
use crate::error::Error;
use crate::port::{ExecutionGateway, LimitOrder, Route};

/// A sized taker trade ready for submission.
///
/// Both legs are limited at the top of book seen when the sweep was sized:
/// the buy at the best ask, the sell at the best bid. Depth beyond the top
/// level only informs the volume; whatever does not fill at those limits is
/// left to the venue.
#[derive(Debug, Clone)]
pub struct TakerPlan {
    pub route: Route,
    pub estimate: ProfitEstimate,
    /// Best ask on the buy venue.
    pub buy_price: Price,
    /// Best bid on the sell venue.
    pub sell_price: Price,
}

impl TakerPlan {
    #[must_use]
    pub fn buy_order(&self) -> LimitOrder {
        LimitOrder {
            venue: self.route.buy_venue.clone(),
            symbol: self.route.symbol.clone(),
            side: OrderSide::Buy,
            amount: self.estimate.volume,
            price: self.buy_price,
            post_only: false,
        }
    }

    #[must_use]
    pub fn sell_order(&self) -> LimitOrder {
        LimitOrder {
            venue: self.route.sell_venue.clone(),
            symbol: self.route.symbol.clone(),
            side: OrderSide::Sell,
            amount: self.estimate.volume,
            price: self.sell_price,
            post_only: false,
        }
    }

    /// Quote currency needed on the buy venue.
    #[must_use]
    pub fn required_quote(&self) -> Decimal {
        self.estimate.volume * self.buy_price
    }
}

/// Result of submitting both legs. Legs are independent: one failing does
/// not undo the other.
#[derive(Debug)]
pub struct TakerFills {
    pub buy: Result<OrderAck, Error>,
    pub sell: Result<OrderAck, Error>,
}

impl TakerFills {
    #[must_use]
    pub fn both_ok(&self) -> bool {
        self.buy.is_ok() && self.sell.is_ok()
    }

    #[must_use]
    pub fn both_failed(&self) -> bool {
        self.buy.is_err() && self.sell.is_err()
    }

    /// One line per leg for the journal.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("buy: {}; sell: {}", leg_summary(&self.buy), leg_summary(&self.sell))
    }
}

fn leg_summary(leg: &Result<OrderAck, Error>) -> String {
    match leg {
        Ok(ack) => format!("order {} {:?}", ack.id, ack.status),
        Err(e) => format!("failed ({e})"),
    }
}

/// Confirm both venues hold enough funds before any order is placed.
///
/// # Errors
///
/// Returns the reason when a balance is unavailable or insufficient.
pub async fn verify_balances(gateway: &dyn ExecutionGateway, plan: &TakerPlan) -> Result<(), String> {
    let route = &plan.route;
    let quote = route.symbol.quote();
    let base = route.symbol.base();

    let (quote_balance, base_balance) = tokio::join!(
        gateway.get_balance(&route.buy_venue, quote),
        gateway.get_balance(&route.sell_venue, base),
    );

    let quote_balance = quote_balance
        .map_err(|e| format!("{quote} balance on {} unavailable: {e}", route.buy_venue))?;
    let base_balance = base_balance
        .map_err(|e| format!("{base} balance on {} unavailable: {e}", route.sell_venue))?;

    let required_quote = plan.required_quote();
    if quote_balance < required_quote {
        return Err(format!(
            "insufficient {quote} on {}: have {quote_balance}, need {required_quote}",
            route.buy_venue
        ));
    }
    if base_balance < plan.estimate.volume {
        return Err(format!(
            "insufficient {base} on {}: have {base_balance}, need {}",
            route.sell_venue, plan.estimate.volume
        ));
    }
    Ok(())
}

/// Submit both legs concurrently.
pub async fn submit(gateway: &dyn ExecutionGateway, plan: &TakerPlan) -> TakerFills {
    let buy_order = plan.buy_order();
    let sell_order = plan.sell_order();
    let (buy, sell) = tokio::join!(
        gateway.create_limit_order(&buy_order),
        gateway.create_limit_order(&sell_order),
    );

    match (&buy, &sell) {
        (Ok(b), Ok(s)) => info!(buy_order = %b.id, sell_order = %s.id, "Taker legs submitted"),
        _ => warn!(
            buy_ok = buy.is_ok(),
            sell_ok = sell.is_ok(),
            "Taker leg failed, other leg left in place"
        ),
    }

    TakerFills { buy, sell }
}
