//! Strategy engine: the scan loop, the trading gate and the maker lifecycle.
//!
//! The engine is a single actor. It owns the [`TradingGate`] and the optional
//! [`MakerTrade`] outright and only mutates them from its own `scan` and
//! `monitor` steps, so at most one capital-committing action is ever in
//! flight without any shared flag.
//!
//! Each step takes the instant it runs at. Transitions made during a step
//! (maker cooldowns, trade creation time) are stamped with that instant. A
//! taker cooldown starts when the sweep returns, which is never earlier.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::pool::ProfitPool;
use super::registry::{BookRegistry, RegistrySnapshot};
use super::taker::{self, TakerPlan};
use crate::domain::id::{BookKey, VenueId};
use crate::domain::journal::{TradeKind, TradeRecord};
use crate::domain::money::FeeRate;
use crate::domain::opportunity::{Direction, Signal, Thresholds};
use crate::domain::profit::ProfitRequest;
use crate::domain::trade::{
    ChaseOrder, Leg, MakerCheck, MakerQuote, MakerTrade, OrderSide, TradingGate,
};
use crate::port::{
    Event, ExecutionGateway, FeeSchedule, LimitOrder, Notifier, Route, TradeRecorder,
};

/// Tunables for the engine. Percentages are in percentage points; fee and
/// offset values are decimal fractions.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub taker_threshold_pct: Decimal,
    pub maker_threshold_pct: Decimal,
    pub max_trade_notional: Decimal,
    pub tick_size: Decimal,
    pub depth_levels: usize,
    pub cooldown: Duration,
    pub maker_timeout: Duration,
    pub scan_interval: Duration,
    pub monitor_interval: Duration,
    /// How far through the open leg's price a chase order is placed.
    pub chase_offset: Decimal,
    /// Fee assumed for venues whose fees could not be fetched.
    pub default_fee: FeeRate,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            taker_threshold_pct: Decimal::new(1, 3),
            maker_threshold_pct: Decimal::ZERO,
            max_trade_notional: Decimal::from(15),
            tick_size: Decimal::new(1, 2),
            depth_levels: 10,
            cooldown: Duration::from_secs(5),
            maker_timeout: Duration::from_secs(30),
            scan_interval: Duration::from_millis(100),
            monitor_interval: Duration::from_secs(1),
            chase_offset: Decimal::new(1, 2),
            default_fee: Decimal::new(1, 3),
        }
    }
}

/// What a scan step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A maker trade is live or the gate is shut.
    Blocked,
    NotEnoughVenues,
    NoOpportunity,
    TakerExecuted,
    TakerAborted,
    MakerPlaced,
    MakerFailed,
}

/// Why an active maker trade was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    QueueJump,
    Timeout,
}

/// What a monitor step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// No maker trade.
    Idle,
    Pending,
    Completed,
    Chased,
    Reset(ResetReason),
}

pub struct StrategyEngine {
    registry: Arc<BookRegistry>,
    gateway: Arc<dyn ExecutionGateway>,
    notifier: Arc<dyn Notifier>,
    recorder: Arc<dyn TradeRecorder>,
    pool: Arc<ProfitPool>,
    settings: EngineSettings,
    fees: HashMap<VenueId, FeeSchedule>,
    gate: TradingGate,
    maker: Option<MakerTrade>,
}

impl StrategyEngine {
    pub fn new(
        registry: Arc<BookRegistry>,
        gateway: Arc<dyn ExecutionGateway>,
        notifier: Arc<dyn Notifier>,
        recorder: Arc<dyn TradeRecorder>,
        pool: Arc<ProfitPool>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            gateway,
            notifier,
            recorder,
            pool,
            settings,
            fees: HashMap::new(),
            gate: TradingGate::default(),
            maker: None,
        }
    }

    /// Fetch each venue's fees once. Venues that fail fall back to the
    /// configured default for the rest of the run.
    pub async fn load_fees(&mut self, venues: &[VenueId]) {
        for venue in venues {
            let schedule = match self.gateway.get_fees(venue).await {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(venue = %venue, error = %e, "Fee lookup failed, using default");
                    FeeSchedule::flat(self.settings.default_fee)
                }
            };
            info!(venue = %venue, maker = %schedule.maker, taker = %schedule.taker, "Fees loaded");
            self.fees.insert(venue.clone(), schedule);
        }
    }

    #[must_use]
    pub fn fees(&self, venue: &VenueId) -> FeeSchedule {
        self.fees
            .get(venue)
            .copied()
            .unwrap_or(FeeSchedule::flat(self.settings.default_fee))
    }

    #[must_use]
    pub fn maker_trade(&self) -> Option<&MakerTrade> {
        self.maker.as_ref()
    }

    #[must_use]
    pub fn gate(&self) -> TradingGate {
        self.gate
    }

    /// Drive scan and monitor steps until `shutdown` flips, then cancel any
    /// resting maker legs.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut scan = interval(self.settings.scan_interval);
        scan.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut monitor = interval(self.settings.monitor_interval);
        monitor.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            scan_ms = self.settings.scan_interval.as_millis(),
            monitor_ms = self.settings.monitor_interval.as_millis(),
            "Strategy engine running"
        );

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = monitor.tick() => {
                    self.monitor(clock()).await;
                }
                _ = scan.tick() => {
                    self.scan(clock()).await;
                }
            }
        }

        self.shutdown().await;
    }

    /// Look for a trade across every venue pair.
    pub async fn scan(&mut self, now: Instant) -> ScanOutcome {
        if self.maker.is_some() || !self.gate.is_open(now) {
            return ScanOutcome::Blocked;
        }

        let snapshot = self.registry.snapshot();
        if snapshot.venue_count() < 2 {
            return ScanOutcome::NotEnoughVenues;
        }

        let (mut takers, mut makers) = self.candidates(&snapshot);
        takers.sort_by(|a, b| b.taker_profit_pct.cmp(&a.taker_profit_pct));
        makers.sort_by(|a, b| b.spread_pct.cmp(&a.spread_pct));

        for direction in &takers {
            if let Some(outcome) = self.try_taker(direction, &snapshot, now).await {
                return outcome;
            }
        }

        for direction in &makers {
            if let Some(outcome) = self.try_maker(direction, &snapshot, now).await {
                return outcome;
            }
        }

        ScanOutcome::NoOpportunity
    }

    fn candidates(&self, snapshot: &RegistrySnapshot) -> (Vec<Direction>, Vec<Direction>) {
        let thresholds = Thresholds {
            taker_pct: self.settings.taker_threshold_pct,
            maker_pct: self.settings.maker_threshold_pct,
        };
        let mut takers = Vec::new();
        let mut makers = Vec::new();

        for (a, b) in snapshot.pairs() {
            for (buy, sell) in [(&a, &b), (&b, &a)] {
                let Some(direction) = self.direction(snapshot, buy, sell) else {
                    continue;
                };
                match direction.signal(thresholds) {
                    Some(Signal::Taker) => takers.push(direction),
                    Some(Signal::Maker) => makers.push(direction),
                    None => {}
                }
            }
        }
        (takers, makers)
    }

    fn direction(&self, snapshot: &RegistrySnapshot, buy: &BookKey, sell: &BookKey) -> Option<Direction> {
        Direction::evaluate(
            buy,
            snapshot.get(buy)?,
            sell,
            snapshot.get(sell)?,
            self.fees(&buy.venue).taker,
            self.fees(&sell.venue).taker,
        )
    }

    /// Size the sweep on real depth and execute it if it still clears the
    /// threshold. `None` means the candidate fell through.
    async fn try_taker(
        &mut self,
        direction: &Direction,
        snapshot: &RegistrySnapshot,
        now: Instant,
    ) -> Option<ScanOutcome> {
        let buy_book = snapshot.get(&direction.buy)?;
        let sell_book = snapshot.get(&direction.sell)?;
        let request = ProfitRequest {
            asks_to_buy: buy_book.top_asks(self.settings.depth_levels),
            bids_to_sell: sell_book.top_bids(self.settings.depth_levels),
            buy_fee: self.fees(direction.buy_venue()).taker,
            sell_fee: self.fees(direction.sell_venue()).taker,
            max_notional: self.settings.max_trade_notional,
        };

        let buy_price = request.asks_to_buy.first()?.price();
        let sell_price = request.bids_to_sell.first()?.price();

        let estimate = self.pool.evaluate(request).await?;
        if estimate.net_profit_pct <= self.settings.taker_threshold_pct {
            debug!(
                buy = %direction.buy_venue(),
                sell = %direction.sell_venue(),
                profit_pct = %estimate.net_profit_pct,
                "Taker candidate below threshold after depth walk"
            );
            return None;
        }

        self.gate.close();
        let route = Route::new(direction.buy_venue(), direction.sell_venue(), direction.symbol());
        let plan = TakerPlan {
            route: route.clone(),
            estimate,
            buy_price,
            sell_price,
        };
        info!(
            buy = %route.buy_venue,
            sell = %route.sell_venue,
            symbol = %route.symbol,
            volume = %estimate.volume,
            profit_usd = %estimate.net_profit_usd,
            profit_pct = %estimate.net_profit_pct,
            "Executing taker trade"
        );
        self.notifier.notify(Event::TakerOpportunity {
            route: route.clone(),
            volume: estimate.volume,
            profit_usd: estimate.net_profit_usd,
            profit_pct: estimate.net_profit_pct,
        });

        let record = TradeRecord::new(
            TradeKind::TakerExecuted,
            &route.buy_venue,
            &route.sell_venue,
            &route.symbol,
            estimate.volume,
            buy_price,
            sell_price,
        );

        if let Err(reason) = taker::verify_balances(self.gateway.as_ref(), &plan).await {
            warn!(reason = %reason, "Taker trade aborted before placing orders");
            self.recorder.record(TradeRecord {
                kind: TradeKind::TakerAborted,
                ..record.with_details(reason.clone())
            });
            self.notifier.notify(Event::TradeAborted { route, reason });
            self.gate.cool_down(settled(now), self.settings.cooldown);
            return Some(ScanOutcome::TakerAborted);
        }

        let fills = taker::submit(self.gateway.as_ref(), &plan).await;
        let outcome = if fills.both_failed() {
            self.recorder.record(TradeRecord {
                kind: TradeKind::TakerAborted,
                ..record.with_details(fills.summary())
            });
            ScanOutcome::TakerAborted
        } else {
            self.recorder.record(
                record
                    .with_profit(estimate.net_profit_usd, estimate.net_profit_pct)
                    .with_details(fills.summary()),
            );
            ScanOutcome::TakerExecuted
        };
        if !fills.both_ok() {
            self.notifier.notify(Event::OrderFailed {
                route,
                reason: fills.summary(),
            });
        }

        self.gate.cool_down(settled(now), self.settings.cooldown);
        Some(outcome)
    }

    /// Quote and place both post-only legs. `None` means the quote was
    /// rejected and nothing was sent.
    async fn try_maker(
        &mut self,
        direction: &Direction,
        snapshot: &RegistrySnapshot,
        now: Instant,
    ) -> Option<ScanOutcome> {
        let buy_book = snapshot.get(&direction.buy)?;
        let sell_book = snapshot.get(&direction.sell)?;
        let quote = match MakerQuote::from_books(
            buy_book,
            sell_book,
            self.settings.tick_size,
            self.settings.max_trade_notional,
        ) {
            Ok(quote) => quote,
            Err(rejection) => {
                debug!(
                    buy = %direction.buy_venue(),
                    sell = %direction.sell_venue(),
                    reason = %rejection,
                    "Maker quote rejected"
                );
                return None;
            }
        };

        self.gate.close();
        self.maker = Some(MakerTrade::placing(
            direction.buy_venue().clone(),
            direction.sell_venue().clone(),
            direction.symbol().clone(),
            quote,
            now,
        ));
        let route = Route::new(direction.buy_venue(), direction.sell_venue(), direction.symbol());

        let buy_order = LimitOrder {
            venue: route.buy_venue.clone(),
            symbol: route.symbol.clone(),
            side: OrderSide::Buy,
            amount: quote.amount,
            price: quote.buy_price,
            post_only: true,
        };
        let sell_order = LimitOrder {
            venue: route.sell_venue.clone(),
            symbol: route.symbol.clone(),
            side: OrderSide::Sell,
            amount: quote.amount,
            price: quote.sell_price,
            post_only: true,
        };
        let (buy, sell) = tokio::join!(
            self.gateway.create_limit_order(&buy_order),
            self.gateway.create_limit_order(&sell_order),
        );

        let record = TradeRecord::new(
            TradeKind::MakerPlaced,
            &route.buy_venue,
            &route.sell_venue,
            &route.symbol,
            quote.amount,
            quote.buy_price,
            quote.sell_price,
        );

        match (buy, sell) {
            (Ok(buy), Ok(sell)) => {
                if let Some(trade) = self.maker.as_mut() {
                    trade.activate(buy.id.clone(), sell.id.clone(), now);
                }
                info!(
                    buy_order = %buy.id,
                    sell_order = %sell.id,
                    buy_price = %quote.buy_price,
                    sell_price = %quote.sell_price,
                    amount = %quote.amount,
                    "Maker trade active"
                );
                self.recorder
                    .record(record.with_details(format!("orders {} / {}", buy.id, sell.id)));
                self.notifier.notify(Event::MakerPlaced {
                    route,
                    buy_price: quote.buy_price,
                    sell_price: quote.sell_price,
                    amount: quote.amount,
                });
                Some(ScanOutcome::MakerPlaced)
            }
            (buy, sell) => {
                let mut reasons = Vec::new();
                for (result, venue) in [(&buy, &route.buy_venue), (&sell, &route.sell_venue)] {
                    match result {
                        Ok(ack) => {
                            if let Err(e) = self.gateway.cancel_order(venue, &ack.id, &route.symbol).await {
                                warn!(venue = %venue, order = %ack.id, error = %e, "Failed to cancel surviving maker leg");
                                reasons.push(format!("cancel {} on {venue} failed: {e}", ack.id));
                            }
                        }
                        Err(e) => reasons.push(format!("{venue}: {e}")),
                    }
                }
                let reason = reasons.join("; ");
                warn!(reason = %reason, "Maker placement failed");

                self.maker = None;
                self.gate.open();
                self.recorder.record(TradeRecord {
                    kind: TradeKind::MakerFailed,
                    ..record.with_details(reason.clone())
                });
                self.notifier.notify(Event::OrderFailed { route, reason });
                Some(ScanOutcome::MakerFailed)
            }
        }
    }

    /// Check the active maker trade: queue jump first, then fills, then age.
    pub async fn monitor(&mut self, now: Instant) -> MonitorOutcome {
        let Some(trade) = self.maker.clone() else {
            return MonitorOutcome::Idle;
        };
        let Some((buy_leg, sell_leg)) = trade.legs() else {
            return MonitorOutcome::Pending;
        };

        let best_bid_buy = self
            .registry
            .get(&BookKey::new(trade.buy_venue.clone(), trade.symbol.clone()))
            .and_then(|book| book.best_bid())
            .map(|level| level.price());
        let best_ask_sell = self
            .registry
            .get(&BookKey::new(trade.sell_venue.clone(), trade.symbol.clone()))
            .and_then(|book| book.best_ask())
            .map(|level| level.price());

        if let Some(jump) = trade.queue_jump(best_bid_buy, best_ask_sell) {
            info!(
                side = %jump.side,
                ours = %jump.ours,
                competing = %jump.competing,
                "Queue jumped, resetting maker trade"
            );
            self.reset(&trade, ResetReason::QueueJump, now).await;
            return MonitorOutcome::Reset(ResetReason::QueueJump);
        }

        let (buy_state, sell_state) = tokio::join!(
            self.gateway
                .fetch_order_status(&buy_leg.venue, &buy_leg.order_id, &buy_leg.symbol),
            self.gateway
                .fetch_order_status(&sell_leg.venue, &sell_leg.order_id, &sell_leg.symbol),
        );

        let check = match (buy_state, sell_state) {
            (Ok(buy_state), Ok(sell_state)) => {
                trade.assess(&buy_state, &sell_state, now, self.settings.maker_timeout)
            }
            (buy_state, sell_state) => {
                warn!(
                    buy_ok = buy_state.is_ok(),
                    sell_ok = sell_state.is_ok(),
                    "Order status unavailable"
                );
                if trade.age(now) > self.settings.maker_timeout {
                    MakerCheck::TimedOut
                } else {
                    MakerCheck::Pending
                }
            }
        };

        match check {
            MakerCheck::Pending => MonitorOutcome::Pending,
            MakerCheck::TimedOut => {
                info!(age_secs = trade.age(now).as_secs(), "Maker trade timed out");
                self.reset(&trade, ResetReason::Timeout, now).await;
                MonitorOutcome::Reset(ResetReason::Timeout)
            }
            MakerCheck::Completed => {
                self.complete(&trade, buy_leg, sell_leg, now);
                MonitorOutcome::Completed
            }
            MakerCheck::Chase { open, filled } => {
                self.chase(&trade, &open, filled, now).await;
                MonitorOutcome::Chased
            }
        }
    }

    fn complete(&mut self, trade: &MakerTrade, buy_leg: &Leg, sell_leg: &Leg, now: Instant) {
        let cost = buy_leg.price * buy_leg.amount;
        let revenue = sell_leg.price * sell_leg.amount;
        let fees = cost * self.fees(&trade.buy_venue).maker + revenue * self.fees(&trade.sell_venue).maker;
        let profit_usd = revenue - cost - fees;
        let profit_pct = if cost.is_zero() {
            Decimal::ZERO
        } else {
            profit_usd / cost * Decimal::ONE_HUNDRED
        };
        info!(profit_usd = %profit_usd, "Maker trade completed");

        let route = Route::new(&trade.buy_venue, &trade.sell_venue, &trade.symbol);
        self.recorder.record(
            TradeRecord::new(
                TradeKind::MakerCompleted,
                &route.buy_venue,
                &route.sell_venue,
                &route.symbol,
                buy_leg.amount,
                buy_leg.price,
                sell_leg.price,
            )
            .with_profit(profit_usd, profit_pct),
        );
        self.notifier.notify(Event::MakerCompleted { route, profit_usd });
        self.finish(now);
    }

    async fn chase(&mut self, trade: &MakerTrade, open: &Leg, filled: Decimal, now: Instant) {
        let route = Route::new(&trade.buy_venue, &trade.sell_venue, &trade.symbol);
        let (buy_price, sell_price) = trade
            .legs()
            .map_or((Decimal::ZERO, Decimal::ZERO), |(b, s)| (b.price, s.price));
        let record = TradeRecord::new(
            TradeKind::MakerChased,
            &route.buy_venue,
            &route.sell_venue,
            &route.symbol,
            open.amount,
            buy_price,
            sell_price,
        );

        if let Err(e) = self
            .gateway
            .cancel_order(&open.venue, &open.order_id, &open.symbol)
            .await
        {
            let reason = format!("cancel {} on {} failed: {e}", open.order_id, open.venue);
            warn!(reason = %reason, "Chase aborted");
            self.recorder.record(record.with_details(reason.clone()));
            self.notifier.notify(Event::OrderFailed { route, reason });
            self.finish(now);
            return;
        }

        let chase = ChaseOrder::for_leg(open, filled, self.settings.chase_offset);
        info!(
            venue = %chase.venue,
            side = %chase.side,
            price = %chase.price,
            amount = %chase.amount,
            "Chasing unfilled leg"
        );
        if chase.amount > Decimal::ZERO {
            let order = LimitOrder {
                venue: chase.venue.clone(),
                symbol: chase.symbol.clone(),
                side: chase.side,
                amount: chase.amount,
                price: chase.price,
                post_only: false,
            };
            match self.gateway.create_limit_order(&order).await {
                Ok(ack) => {
                    self.recorder.record(
                        record.with_details(format!("{} {} @ {} as {}", chase.side, chase.amount, chase.price, ack.id)),
                    );
                    self.notifier.notify(Event::MakerChasing {
                        route,
                        venue: chase.venue,
                        price: chase.price,
                        amount: chase.amount,
                    });
                }
                Err(e) => {
                    let reason = format!("chase order on {} failed: {e}", chase.venue);
                    warn!(reason = %reason, "Chase order rejected");
                    self.recorder.record(record.with_details(reason.clone()));
                    self.notifier.notify(Event::OrderFailed { route, reason });
                }
            }
        }

        self.finish(now);
    }

    async fn reset(&mut self, trade: &MakerTrade, reason: ResetReason, now: Instant) {
        self.cancel_legs(trade).await;

        let route = Route::new(&trade.buy_venue, &trade.sell_venue, &trade.symbol);
        let label = match reason {
            ResetReason::QueueJump => "queue jump",
            ResetReason::Timeout => "timeout",
        };
        self.recorder.record(
            TradeRecord::new(
                TradeKind::MakerReset,
                &route.buy_venue,
                &route.sell_venue,
                &route.symbol,
                trade.quote.amount,
                trade.quote.buy_price,
                trade.quote.sell_price,
            )
            .with_details(label),
        );
        self.notifier.notify(Event::MakerReset {
            route,
            reason: label.to_string(),
        });
        self.finish(now);
    }

    /// Cancel both legs concurrently. Failures are logged; the trade is
    /// dropped either way.
    async fn cancel_legs(&self, trade: &MakerTrade) {
        let Some((buy_leg, sell_leg)) = trade.legs() else {
            return;
        };
        let (buy, sell) = tokio::join!(
            self.gateway
                .cancel_order(&buy_leg.venue, &buy_leg.order_id, &buy_leg.symbol),
            self.gateway
                .cancel_order(&sell_leg.venue, &sell_leg.order_id, &sell_leg.symbol),
        );
        for (result, leg) in [(buy, buy_leg), (sell, sell_leg)] {
            if let Err(e) = result {
                warn!(venue = %leg.venue, order = %leg.order_id, error = %e, "Cancel failed");
            }
        }
    }

    fn finish(&mut self, now: Instant) {
        self.maker = None;
        self.gate.cool_down(now, self.settings.cooldown);
    }

    /// Cancel resting maker legs before the process exits.
    pub async fn shutdown(&mut self) {
        if let Some(trade) = self.maker.take() {
            info!(symbol = %trade.symbol, "Cancelling active maker trade for shutdown");
            self.cancel_legs(&trade).await;
        }
        self.gate.close();
    }
}

/// The later of `started` and the current clock.
fn settled(started: Instant) -> Instant {
    started.max(clock())
}

fn clock() -> Instant {
    tokio::time::Instant::now().into_std()
}
