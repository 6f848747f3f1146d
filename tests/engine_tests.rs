//! Strategy engine scenarios driven step by step against scripted venues.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossarb::application::engine::{
    EngineSettings, MonitorOutcome, ResetReason, ScanOutcome, StrategyEngine,
};
use crossarb::application::pool::ProfitPool;
use crossarb::application::registry::BookRegistry;
use crossarb::domain::journal::TradeKind;
use crossarb::domain::trade::{MakerStatus, OrderSide, OrderStatus};
use crossarb::port::Event;
use crossarb::domain::book::BookDelta;
use crossarb::testkit::domain::{levels, top_of_book};
use crossarb::testkit::gateway::ScriptedGateway;
use crossarb::testkit::sink::{MemoryRecorder, RecordingNotifier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SYMBOL: &str = "BTC/USDT";

struct Harness {
    registry: Arc<BookRegistry>,
    gateway: Arc<ScriptedGateway>,
    notifier: Arc<RecordingNotifier>,
    recorder: Arc<MemoryRecorder>,
    engine: StrategyEngine,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    fn with_settings(settings: EngineSettings) -> Self {
        let registry = Arc::new(BookRegistry::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let recorder = Arc::new(MemoryRecorder::new());
        let engine = StrategyEngine::new(
            Arc::clone(&registry),
            Arc::clone(&gateway) as _,
            Arc::clone(&notifier) as _,
            Arc::clone(&recorder) as _,
            Arc::new(ProfitPool::new(2)),
            settings,
        );
        Self {
            registry,
            gateway,
            notifier,
            recorder,
            engine,
        }
    }

    fn book(&self, venue: &str, bid: Decimal, ask: Decimal) {
        self.registry
            .apply_delta(&top_of_book(venue, SYMBOL, bid, ask))
            .unwrap();
    }

    /// Books with a positive spread that fees eat: a maker-only setup
    /// buying on `a` and selling on `b`.
    fn maker_books(&self) {
        self.book("a", dec!(99.90), dec!(100.00));
        self.book("b", dec!(100.05), dec!(100.20));
    }

    /// Buy on `a` at 100, sell on `b` at 102: clears taker fees easily.
    fn taker_books(&self) {
        self.book("a", dec!(99), dec!(100));
        self.book("b", dec!(102), dec!(103));
    }

    fn depth(&self, venue: &str, bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) {
        self.registry
            .apply_delta(&BookDelta::snapshot(venue, SYMBOL, levels(bids), levels(asks)))
            .unwrap();
    }

    fn fund_taker(&self) {
        self.gateway.set_balance("a", "USDT", dec!(1000));
        self.gateway.set_balance("b", "BTC", dec!(10));
    }
}

#[tokio::test]
async fn single_venue_is_not_enough() {
    let mut h = Harness::new();
    h.book("a", dec!(99), dec!(100));
    assert_eq!(h.engine.scan(Instant::now()).await, ScanOutcome::NotEnoughVenues);
}

#[tokio::test]
async fn flat_books_yield_nothing() {
    let mut h = Harness::new();
    h.book("a", dec!(99), dec!(100));
    h.book("b", dec!(99), dec!(100));
    assert_eq!(h.engine.scan(Instant::now()).await, ScanOutcome::NoOpportunity);
    assert!(h.gateway.created().is_empty());
}

#[tokio::test]
async fn maker_trade_places_post_only_legs_one_tick_inside() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::MakerPlaced);

    let created = h.gateway.created();
    assert_eq!(created.len(), 2);
    let buy = created.iter().find(|o| o.side == OrderSide::Buy).unwrap();
    let sell = created.iter().find(|o| o.side == OrderSide::Sell).unwrap();
    assert_eq!(buy.venue.as_str(), "a");
    assert_eq!(buy.price, dec!(99.91));
    assert_eq!(sell.venue.as_str(), "b");
    assert_eq!(sell.price, dec!(100.19));
    assert!(buy.post_only && sell.post_only);
    assert_eq!(buy.amount, sell.amount);
    assert!(buy.amount * buy.price <= dec!(15));

    let trade = h.engine.maker_trade().unwrap();
    assert!(matches!(trade.status, MakerStatus::Active { .. }));
    assert_eq!(h.recorder.kinds(), vec![TradeKind::MakerPlaced]);
}

#[tokio::test]
async fn active_maker_blocks_further_scans() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();
    h.engine.scan(now).await;

    h.taker_books();
    h.fund_taker();
    assert_eq!(h.engine.scan(now).await, ScanOutcome::Blocked);
    assert_eq!(h.gateway.created().len(), 2);
}

#[tokio::test]
async fn two_maker_pairs_in_one_tick_start_a_single_trade() {
    let mut h = Harness::new();
    h.maker_books();
    // `a` -> `c` is maker-eligible too.
    h.book("c", dec!(100.03), dec!(100.20));
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::MakerPlaced);
    assert_eq!(h.engine.scan(now).await, ScanOutcome::Blocked);

    let created = h.gateway.created();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|o| o.post_only));
    assert_eq!(
        created.iter().filter(|o| o.side == OrderSide::Buy).count(),
        1
    );
    assert!(h.engine.maker_trade().is_some());
    assert_eq!(h.recorder.kinds(), vec![TradeKind::MakerPlaced]);
}

#[tokio::test]
async fn queue_jump_resets_without_checking_fills() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();
    h.engine.scan(now).await;

    // A competitor now bids above our 99.91 buy leg.
    h.book("a", dec!(99.95), dec!(100.00));

    let outcome = h.engine.monitor(now + Duration::from_secs(1)).await;
    assert_eq!(outcome, MonitorOutcome::Reset(ResetReason::QueueJump));
    assert_eq!(h.gateway.status_calls(), 0);
    assert_eq!(h.gateway.cancelled().len(), 2);
    assert!(h.engine.maker_trade().is_none());
    assert_eq!(
        h.recorder.kinds(),
        vec![TradeKind::MakerPlaced, TradeKind::MakerReset]
    );
}

#[tokio::test]
async fn maker_times_out_after_thirty_seconds() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();
    h.engine.scan(now).await;

    assert_eq!(
        h.engine.monitor(now + Duration::from_secs(29)).await,
        MonitorOutcome::Pending
    );
    assert_eq!(
        h.engine.monitor(now + Duration::from_secs(31)).await,
        MonitorOutcome::Reset(ResetReason::Timeout)
    );
    assert_eq!(h.gateway.cancelled().len(), 2);
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|e| matches!(e, Event::MakerReset { reason, .. } if reason == "timeout")));
}

#[tokio::test]
async fn both_legs_filled_completes_and_cools_down() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();
    h.engine.scan(now).await;

    let trade = h.engine.maker_trade().unwrap().clone();
    let (buy_leg, sell_leg) = trade.legs().unwrap();
    h.gateway
        .set_status(&buy_leg.order_id, OrderStatus::Closed, buy_leg.amount);
    h.gateway
        .set_status(&sell_leg.order_id, OrderStatus::Closed, sell_leg.amount);

    let later = now + Duration::from_secs(2);
    assert_eq!(h.engine.monitor(later).await, MonitorOutcome::Completed);
    assert!(h.engine.maker_trade().is_none());
    assert!(!h.engine.gate().is_open(later));
    assert!(h.engine.gate().is_open(later + Duration::from_secs(5)));

    let completed = h.recorder.records().pop().unwrap();
    assert_eq!(completed.kind, TradeKind::MakerCompleted);
    assert!(completed.profit_usd.unwrap() > Decimal::ZERO);
}

#[tokio::test]
async fn one_filled_leg_chases_the_other() {
    let mut h = Harness::new();
    h.maker_books();
    let now = Instant::now();
    h.engine.scan(now).await;

    let trade = h.engine.maker_trade().unwrap().clone();
    let (buy_leg, sell_leg) = trade.legs().unwrap();
    h.gateway
        .set_status(&buy_leg.order_id, OrderStatus::Closed, buy_leg.amount);

    assert_eq!(
        h.engine.monitor(now + Duration::from_secs(1)).await,
        MonitorOutcome::Chased
    );
    assert_eq!(h.gateway.cancelled(), vec![sell_leg.order_id.clone()]);

    let chase = h.gateway.created().pop().unwrap();
    assert_eq!(chase.side, OrderSide::Sell);
    assert_eq!(chase.venue.as_str(), "b");
    assert_eq!(chase.price, dec!(100.19) * dec!(0.99));
    assert_eq!(chase.amount, sell_leg.amount);
    assert!(!chase.post_only);
    assert!(h.engine.maker_trade().is_none());
}

#[tokio::test]
async fn failed_leg_cancels_the_survivor_and_reopens_the_gate() {
    let mut h = Harness::new();
    h.maker_books();
    h.gateway.reject_orders_on("b");
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::MakerFailed);
    assert_eq!(h.gateway.cancelled().len(), 1);
    assert!(h.engine.maker_trade().is_none());
    assert!(h.engine.gate().is_open(now));
    assert_eq!(h.recorder.kinds(), vec![TradeKind::MakerFailed]);
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|e| matches!(e, Event::OrderFailed { .. })));
}

#[tokio::test]
async fn taker_takes_precedence_over_maker() {
    let mut h = Harness::new();
    h.taker_books();
    // `a` -> `c` is only a maker opportunity.
    h.book("c", dec!(100.05), dec!(100.50));
    h.fund_taker();
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::TakerExecuted);

    let created = h.gateway.created();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|o| !o.post_only));
    let buy = created.iter().find(|o| o.side == OrderSide::Buy).unwrap();
    let sell = created.iter().find(|o| o.side == OrderSide::Sell).unwrap();
    assert_eq!(buy.venue.as_str(), "a");
    assert_eq!(sell.venue.as_str(), "b");
    assert!(h.engine.maker_trade().is_none());

    assert_eq!(h.engine.scan(now + Duration::from_secs(1)).await, ScanOutcome::Blocked);
    assert_eq!(h.recorder.kinds(), vec![TradeKind::TakerExecuted]);
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|e| matches!(e, Event::TakerOpportunity { .. })));
}

#[tokio::test]
async fn taker_aborts_without_funds() {
    let mut h = Harness::new();
    h.taker_books();
    h.gateway.set_balance("a", "USDT", dec!(1));
    h.gateway.set_balance("b", "BTC", dec!(10));
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::TakerAborted);
    assert!(h.gateway.created().is_empty());
    assert_eq!(h.recorder.kinds(), vec![TradeKind::TakerAborted]);
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|e| matches!(e, Event::TradeAborted { reason, .. } if reason.contains("insufficient USDT"))));
    assert!(!h.engine.gate().is_open(now));
}

#[tokio::test]
async fn shutdown_cancels_resting_legs() {
    let mut h = Harness::new();
    h.maker_books();
    h.engine.scan(Instant::now()).await;

    h.engine.shutdown().await;
    assert_eq!(h.gateway.cancelled().len(), 2);
    assert!(h.engine.maker_trade().is_none());
}

#[tokio::test]
async fn taker_legs_are_limited_at_top_of_book() {
    let mut h = Harness::with_settings(EngineSettings {
        max_trade_notional: dec!(1000),
        ..EngineSettings::default()
    });
    h.depth("a", &[(dec!(99), dec!(1))], &[(dec!(100), dec!(1)), (dec!(101), dec!(5))]);
    h.depth("b", &[(dec!(105), dec!(1)), (dec!(104), dec!(5))], &[(dec!(106), dec!(1))]);
    h.fund_taker();

    assert_eq!(h.engine.scan(Instant::now()).await, ScanOutcome::TakerExecuted);

    let created = h.gateway.created();
    let buy = created.iter().find(|o| o.side == OrderSide::Buy).unwrap();
    let sell = created.iter().find(|o| o.side == OrderSide::Sell).unwrap();
    assert_eq!(buy.amount, dec!(6));
    assert_eq!(buy.price, dec!(100));
    assert_eq!(sell.amount, dec!(6));
    assert_eq!(sell.price, dec!(105));

    let record = h.recorder.records().pop().unwrap();
    assert_eq!(record.buy_price, dec!(100));
    assert_eq!(record.sell_price, dec!(105));
}

#[tokio::test]
async fn taker_balance_check_uses_the_best_ask() {
    let mut h = Harness::with_settings(EngineSettings {
        max_trade_notional: dec!(1000),
        ..EngineSettings::default()
    });
    h.depth("a", &[(dec!(99), dec!(1))], &[(dec!(100), dec!(1)), (dec!(101), dec!(5))]);
    h.depth("b", &[(dec!(105), dec!(1)), (dec!(104), dec!(5))], &[(dec!(106), dec!(1))]);
    // 6 x 100 fits, 6 x 101 would not.
    h.gateway.set_balance("a", "USDT", dec!(600));
    h.gateway.set_balance("b", "BTC", dec!(6));

    assert_eq!(h.engine.scan(Instant::now()).await, ScanOutcome::TakerExecuted);
}

#[tokio::test(start_paused = true)]
async fn taker_cooldown_starts_when_the_sweep_returns() {
    let mut h = Harness::new();
    h.taker_books();
    h.fund_taker();
    h.gateway.delay_orders(Duration::from_secs(3));
    let now = Instant::now();

    assert_eq!(h.engine.scan(now).await, ScanOutcome::TakerExecuted);
    assert!(!h.engine.gate().is_open(now + Duration::from_secs(5)));
    assert!(h.engine.gate().is_open(now + Duration::from_secs(9)));
}
