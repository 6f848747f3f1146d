//! Composition root helpers: turn a [`Config`] into live components.

use std::sync::Arc;
#[cfg(feature = "telegram")]
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::{TelegramConfig, TelegramNotifier};
use crate::adapter::outbound::paper::PaperGateway;
use crate::adapter::outbound::sqlite::SqliteJournal;
use crate::adapter::outbound::venue::{BinanceProtocol, OkxProtocol, WsFeed};
use crate::application::pool::ProfitPool;
use crate::application::registry::BookRegistry;
use crate::domain::id::VenueId;
use crate::domain::money::percent_to_fraction;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::venue::{VenueConfig, VenueKind};
use crate::infrastructure::exchange::ReconnectingStream;
use crate::port::{FeeSchedule, LogNotifier, MarketDataStream, NotifierRegistry};

/// Delivery loops owned by notifier backends, each resolving to its task
/// name when it exits.
pub(crate) type NotifierWorkers = JoinSet<String>;

/// Build the notifier registry. The log notifier is always present; Telegram
/// is added when enabled and its credentials are in the environment. Its
/// delivery loop is spawned into the returned set for supervision.
#[cfg(feature = "telegram")]
pub(crate) fn build_notifiers(config: &Config) -> (NotifierRegistry, NotifierWorkers) {
    let mut registry = NotifierRegistry::new();
    let mut workers = JoinSet::new();
    registry.register(Box::new(LogNotifier));

    if config.telegram.enabled {
        let min_interval = Duration::from_millis(config.telegram.min_interval_ms);
        match TelegramConfig::from_env(config.telegram.notify_opportunities, min_interval) {
            Some(tg_config) => {
                let (notifier, worker) = TelegramNotifier::new(tg_config);
                registry.register(Box::new(notifier));
                workers.spawn(async move {
                    worker.await;
                    "notifier:telegram".to_string()
                });
                info!("Telegram notifier enabled");
            }
            None => warn!("Telegram enabled but TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set"),
        }
    }

    (registry, workers)
}

/// Build notifier registry from configuration (non-telegram variant).
#[cfg(not(feature = "telegram"))]
pub(crate) fn build_notifiers(config: &Config) -> (NotifierRegistry, NotifierWorkers) {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    if config.telegram.enabled {
        warn!("Telegram enabled in config but the telegram feature is not compiled in");
    }
    (registry, JoinSet::new())
}

/// Open the trade journal.
pub(crate) fn init_journal(config: &Config) -> Result<Arc<SqliteJournal>> {
    let journal = SqliteJournal::open(&config.database)?;
    Ok(Arc::new(journal))
}

/// Paper gateway over the live books, seeded from `[paper]`.
pub(crate) fn build_gateway(config: &Config, registry: Arc<BookRegistry>) -> PaperGateway {
    let mut gateway = PaperGateway::new(registry, config.venue_ids());

    for (venue, balances) in &config.paper.balances {
        for (currency, amount) in balances {
            gateway = gateway.with_balance(VenueId::from(venue.as_str()), currency, *amount);
        }
    }
    for (venue, fees) in &config.paper.fees {
        let schedule = FeeSchedule {
            maker: percent_to_fraction(fees.maker_pct),
            taker: percent_to_fraction(fees.taker_pct),
        };
        gateway = gateway.with_fees(VenueId::from(venue.as_str()), schedule);
    }

    info!(venues = config.venues.len(), "Paper gateway ready");
    gateway
}

/// Profit worker pool sized from `[pool]`; zero workers means one per core
/// minus the reserved ones.
pub(crate) fn build_pool(config: &Config) -> ProfitPool {
    if config.pool.workers > 0 {
        ProfitPool::new(config.pool.workers)
    } else {
        ProfitPool::for_available_cores(config.pool.reserved_cores)
    }
}

/// Reconnecting depth feed for one configured venue.
pub(crate) fn build_feed(config: &Config, venue: &VenueConfig) -> Box<dyn MarketDataStream> {
    let id = VenueId::from(venue.name.as_str());
    let delay = config.feed.reconnect_delay();
    match venue.kind {
        VenueKind::Binance => Box::new(ReconnectingStream::new(
            WsFeed::new(id, venue.ws_url(), BinanceProtocol::new()),
            delay,
        )),
        VenueKind::Okx => Box::new(ReconnectingStream::new(
            WsFeed::new(id, venue.ws_url(), OkxProtocol::new()),
            delay,
        )),
    }
}
