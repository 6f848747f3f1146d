//! Greedy depth walk computing fillable arbitrage volume and net profit.

use rust_decimal::Decimal;

use super::book::PriceLevel;
use super::money::{FeeRate, Price, Volume, EPSILON};

/// Outcome of walking two depth snapshots against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitEstimate {
    pub volume: Volume,
    pub buy_cost: Decimal,
    pub sell_revenue: Decimal,
    pub net_profit_usd: Decimal,
    pub net_profit_pct: Decimal,
    /// Highest ask price consumed by the walk.
    pub max_buy_price: Price,
    /// Lowest bid price consumed by the walk.
    pub min_sell_price: Price,
}

/// Owned inputs for one evaluation, so it can move onto a worker thread.
#[derive(Debug, Clone)]
pub struct ProfitRequest {
    pub asks_to_buy: Vec<PriceLevel>,
    pub bids_to_sell: Vec<PriceLevel>,
    pub buy_fee: FeeRate,
    pub sell_fee: FeeRate,
    pub max_notional: Decimal,
}

impl ProfitRequest {
    #[must_use]
    pub fn evaluate(&self) -> Option<ProfitEstimate> {
        evaluate(
            &self.asks_to_buy,
            &self.bids_to_sell,
            self.buy_fee,
            self.sell_fee,
            self.max_notional,
        )
    }
}

/// Walk asks (ascending) against bids (descending) while the spread is
/// positive, the marginal fill is profitable after fees, and the notional
/// cap has room left.
///
/// Fees are decimal fractions. Returns `None` when nothing is fillable.
#[must_use]
pub fn evaluate(
    asks_to_buy: &[PriceLevel],
    bids_to_sell: &[PriceLevel],
    buy_fee: FeeRate,
    sell_fee: FeeRate,
    max_notional: Decimal,
) -> Option<ProfitEstimate> {
    let mut buy_idx = 0;
    let mut sell_idx = 0;
    let mut buy_left = asks_to_buy.first().map_or(Decimal::ZERO, PriceLevel::size);
    let mut sell_left = bids_to_sell.first().map_or(Decimal::ZERO, PriceLevel::size);

    let mut volume = Decimal::ZERO;
    let mut buy_cost = Decimal::ZERO;
    let mut sell_revenue = Decimal::ZERO;
    let mut fees = Decimal::ZERO;
    let mut max_buy_price = Decimal::ZERO;
    let mut min_sell_price = Decimal::ZERO;

    while buy_idx < asks_to_buy.len() && sell_idx < bids_to_sell.len() {
        let ask = asks_to_buy[buy_idx].price();
        let bid = bids_to_sell[sell_idx].price();
        if ask <= Decimal::ZERO || ask >= bid {
            break;
        }

        let Some(allowed) = (max_notional - buy_cost).checked_div(ask) else {
            break;
        };
        let vol = buy_left.min(sell_left).min(allowed);
        if vol < EPSILON {
            break;
        }

        let cost = vol * ask;
        let revenue = vol * bid;
        let step_fees = cost * buy_fee + revenue * sell_fee;
        if revenue - cost - step_fees <= Decimal::ZERO {
            break;
        }

        volume += vol;
        buy_cost += cost;
        sell_revenue += revenue;
        fees += step_fees;
        max_buy_price = ask;
        min_sell_price = bid;

        buy_left -= vol;
        sell_left -= vol;
        if buy_left <= EPSILON {
            buy_idx += 1;
            buy_left = asks_to_buy.get(buy_idx).map_or(Decimal::ZERO, PriceLevel::size);
        }
        if sell_left <= EPSILON {
            sell_idx += 1;
            sell_left = bids_to_sell.get(sell_idx).map_or(Decimal::ZERO, PriceLevel::size);
        }

        if buy_cost >= max_notional {
            break;
        }
    }

    if volume.is_zero() {
        return None;
    }

    let net_profit_usd = sell_revenue - buy_cost - fees;
    let net_profit_pct = if buy_cost.is_zero() {
        Decimal::ZERO
    } else {
        net_profit_usd / buy_cost * Decimal::ONE_HUNDRED
    };

    Some(ProfitEstimate {
        volume,
        buy_cost,
        sell_revenue,
        net_profit_usd,
        net_profit_pct,
        max_buy_price,
        min_sell_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn levels(raw: &[(Decimal, Decimal)]) -> Vec<PriceLevel> {
        raw.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect()
    }

    #[test]
    fn single_level_capped_by_notional() {
        let asks = levels(&[(dec!(100), dec!(2))]);
        let bids = levels(&[(dec!(101), dec!(2))]);

        let est = evaluate(&asks, &bids, dec!(0), dec!(0), dec!(150)).unwrap();

        assert_eq!(est.volume, dec!(1.5));
        assert_eq!(est.buy_cost, dec!(150.0));
        assert_eq!(est.sell_revenue, dec!(151.5));
        assert_eq!(est.net_profit_usd, dec!(1.5));
        assert_eq!(est.net_profit_pct, dec!(1.0));
    }

    #[test]
    fn no_crossing_yields_nothing() {
        let asks = levels(&[(dec!(100), dec!(1))]);
        let bids = levels(&[(dec!(99), dec!(1))]);
        assert!(evaluate(&asks, &bids, dec!(0), dec!(0), dec!(1000)).is_none());
    }

    #[test]
    fn equal_prices_do_not_cross() {
        let asks = levels(&[(dec!(100), dec!(1))]);
        let bids = levels(&[(dec!(100), dec!(1))]);
        assert!(evaluate(&asks, &bids, dec!(0), dec!(0), dec!(1000)).is_none());
    }

    #[test]
    fn empty_sides_yield_nothing() {
        let bids = levels(&[(dec!(101), dec!(1))]);
        assert!(evaluate(&[], &bids, dec!(0), dec!(0), dec!(1000)).is_none());
        assert!(evaluate(&bids, &[], dec!(0), dec!(0), dec!(1000)).is_none());
    }

    #[test]
    fn walks_multiple_levels_until_spread_closes() {
        let asks = levels(&[(dec!(100), dec!(1)), (dec!(101), dec!(1)), (dec!(103), dec!(5))]);
        let bids = levels(&[(dec!(102), dec!(1.5)), (dec!(101.5), dec!(5))]);

        let est = evaluate(&asks, &bids, dec!(0), dec!(0), dec!(10000)).unwrap();

        // 1 @ 100 -> 102, 0.5 @ 101 -> 102, 0.5 @ 101 -> 101.5, then 103 > 101.5.
        assert_eq!(est.volume, dec!(2));
        assert_eq!(est.buy_cost, dec!(201));
        assert_eq!(est.sell_revenue, dec!(203.75));
        assert_eq!(est.max_buy_price, dec!(101));
        assert_eq!(est.min_sell_price, dec!(101.5));
    }

    #[test]
    fn fees_stop_unprofitable_level() {
        let asks = levels(&[(dec!(100), dec!(1)), (dec!(100.9), dec!(1))]);
        let bids = levels(&[(dec!(101), dec!(2))]);

        // 0.1% per side: first level nets ~0.799, second level would lose.
        let est = evaluate(&asks, &bids, dec!(0.001), dec!(0.001), dec!(10000)).unwrap();

        assert_eq!(est.volume, dec!(1));
        assert_eq!(est.net_profit_usd, dec!(1) - dec!(0.1) - dec!(0.101));
    }

    #[test]
    fn fees_larger_than_spread_yield_nothing() {
        let asks = levels(&[(dec!(100), dec!(1))]);
        let bids = levels(&[(dec!(100.1), dec!(1))]);
        assert!(evaluate(&asks, &bids, dec!(0.001), dec!(0.001), dec!(1000)).is_none());
    }

    #[test]
    fn zero_notional_yields_nothing() {
        let asks = levels(&[(dec!(100), dec!(1))]);
        let bids = levels(&[(dec!(101), dec!(1))]);
        assert!(evaluate(&asks, &bids, dec!(0), dec!(0), dec!(0)).is_none());
    }

    #[test]
    fn request_matches_free_function() {
        let request = ProfitRequest {
            asks_to_buy: levels(&[(dec!(100), dec!(2))]),
            bids_to_sell: levels(&[(dec!(101), dec!(2))]),
            buy_fee: dec!(0.001),
            sell_fee: dec!(0.002),
            max_notional: dec!(150),
        };
        assert_eq!(
            request.evaluate(),
            evaluate(
                &request.asks_to_buy,
                &request.bids_to_sell,
                request.buy_fee,
                request.sell_fee,
                request.max_notional
            )
        );
    }
}
