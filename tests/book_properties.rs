//! Randomized checks of book ordering and the depth walk, with fixed seeds
//! so failures reproduce.

use std::collections::HashMap;

use crossarb::domain::book::{OrderBook, PriceLevel};
use crossarb::domain::profit::evaluate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn random_level(rng: &mut StdRng) -> PriceLevel {
    let price = Decimal::new(rng.gen_range(9_900..10_100), 2);
    // Roughly one update in five deletes the level.
    let size = if rng.gen_bool(0.2) {
        Decimal::ZERO
    } else {
        Decimal::new(rng.gen_range(1..500), 2)
    };
    PriceLevel::new(price, size)
}

fn sorted_model(model: &HashMap<Decimal, Decimal>, descending: bool) -> Vec<(Decimal, Decimal)> {
    let mut levels: Vec<_> = model.iter().map(|(p, s)| (*p, *s)).collect();
    levels.sort_by(|a, b| a.0.cmp(&b.0));
    if descending {
        levels.reverse();
    }
    levels
}

#[test]
fn incremental_updates_match_a_reference_model() {
    for seed in 0..20_u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut book = OrderBook::new();
        let mut bids: HashMap<Decimal, Decimal> = HashMap::new();
        let mut asks: HashMap<Decimal, Decimal> = HashMap::new();

        for _ in 0..200 {
            let bid_updates: Vec<_> = (0..rng.gen_range(0..4)).map(|_| random_level(&mut rng)).collect();
            let ask_updates: Vec<_> = (0..rng.gen_range(0..4)).map(|_| random_level(&mut rng)).collect();
            book.update(&bid_updates, &ask_updates);

            for (model, updates) in [(&mut bids, &bid_updates), (&mut asks, &ask_updates)] {
                for level in updates {
                    if level.size() <= Decimal::ZERO {
                        model.remove(&level.price());
                    } else {
                        model.insert(level.price(), level.size());
                    }
                }
            }
        }

        let got_bids: Vec<_> = book
            .top_bids(usize::MAX)
            .iter()
            .map(|l| (l.price(), l.size()))
            .collect();
        let got_asks: Vec<_> = book
            .top_asks(usize::MAX)
            .iter()
            .map(|l| (l.price(), l.size()))
            .collect();
        assert_eq!(got_bids, sorted_model(&bids, true), "bids, seed {seed}");
        assert_eq!(got_asks, sorted_model(&asks, false), "asks, seed {seed}");
        assert!(got_bids.iter().chain(&got_asks).all(|(_, size)| *size > Decimal::ZERO));
    }
}

#[test]
fn top_n_is_a_prefix_of_full_depth() {
    let mut rng = StdRng::seed_from_u64(7);
    let levels: Vec<_> = (0..50).map(|_| random_level(&mut rng)).collect();
    let book = OrderBook::with_levels(&levels, &levels);

    let full = book.top_bids(usize::MAX);
    for n in [0, 1, 5, 10, 1000] {
        let top = book.top_bids(n);
        assert_eq!(top.len(), n.min(full.len()));
        assert_eq!(top.as_slice(), &full[..top.len()]);
    }
}

#[test]
fn depth_walk_respects_cap_and_never_crosses() {
    for seed in 0..50_u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut asks: Vec<_> = (0..10)
            .map(|_| PriceLevel::new(Decimal::new(rng.gen_range(9_950..10_050), 2), Decimal::new(rng.gen_range(1..50), 3)))
            .collect();
        let mut bids: Vec<_> = (0..10)
            .map(|_| PriceLevel::new(Decimal::new(rng.gen_range(9_950..10_050), 2), Decimal::new(rng.gen_range(1..50), 3)))
            .collect();
        asks.sort_by(|a, b| a.price().cmp(&b.price()));
        bids.sort_by(|a, b| b.price().cmp(&a.price()));
        let cap = Decimal::from(rng.gen_range(1..40));

        let Some(estimate) = evaluate(&asks, &bids, dec!(0), dec!(0), cap) else {
            continue;
        };
        assert!(estimate.volume > Decimal::ZERO, "seed {seed}");
        assert!(estimate.buy_cost <= cap + dec!(0.000001), "seed {seed}");
        assert!(estimate.max_buy_price < estimate.min_sell_price, "seed {seed}");
        assert!(estimate.net_profit_usd > Decimal::ZERO, "seed {seed}");
    }
}
