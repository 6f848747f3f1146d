//! Runtime lifecycle: wire components, supervise tasks, shut down cleanly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::stream::run_feed;
use crate::application::engine::StrategyEngine;
use crate::application::registry::BookRegistry;
use crate::domain::id::Symbol;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::{
    build_feed, build_gateway, build_notifiers, build_pool, init_journal, NotifierWorkers,
};
use crate::infrastructure::config::settings::Config;
use crate::port::{Event, ExecutionGateway, MarketDataStream, Notifier, TradeRecorder};

type TaskResult = (String, Result<()>);

/// Run until `shutdown` flips to `true` or a supervised task stops.
///
/// # Errors
/// Returns an error if startup wiring fails or a feed or the engine stops
/// on its own.
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let venues = config.venue_ids();
    info!(venues = venues.len(), symbols = config.feed.symbols.len(), "Starting crossarb");

    let registry = Arc::new(BookRegistry::new());
    let (notifiers, mut workers) = build_notifiers(&config);
    let notifiers: Arc<dyn Notifier> = Arc::new(notifiers);
    let journal = init_journal(&config)?;
    let recorder: Arc<dyn TradeRecorder> = journal;
    let gateway: Arc<dyn ExecutionGateway> =
        Arc::new(build_gateway(&config, Arc::clone(&registry)));
    let pool = Arc::new(build_pool(&config));
    info!(workers = pool.size(), "Profit pool ready");

    let mut engine = StrategyEngine::new(
        Arc::clone(&registry),
        gateway,
        Arc::clone(&notifiers),
        Arc::clone(&recorder),
        Arc::clone(&pool),
        config.engine_settings(),
    );
    engine.load_fees(&venues).await;

    let feeds = config
        .venues
        .iter()
        .map(|venue| build_feed(&config, venue))
        .collect();

    notifiers.notify(Event::Startup { venues });

    let outcome = supervise(
        engine,
        feeds,
        &mut workers,
        registry,
        config.symbols(),
        Arc::clone(&notifiers),
        config.shutdown_grace(),
        shutdown,
    )
    .await;

    pool.close();
    recorder.flush().await;
    notifiers.notify(Event::Shutdown);
    close_notifiers(notifiers.as_ref(), &mut workers, config.shutdown_grace()).await;
    info!("Shutdown complete");
    outcome
}

/// Close every notifier and wait up to `grace` for their delivery loops to
/// send what is still queued.
pub(crate) async fn close_notifiers(
    notifier: &dyn Notifier,
    workers: &mut NotifierWorkers,
    grace: Duration,
) {
    notifier.close();
    let drained = tokio::time::timeout(grace, async {
        while workers.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(grace_secs = grace.as_secs(), "Notifiers did not drain in time, aborting");
        workers.abort_all();
    }
}

/// Run the feeds and the engine as one task set, watching the notifier
/// delivery loops alongside them.
///
/// External shutdown resolves to `Ok`. The first task to stop on its own
/// raises a critical failure and resolves to its error. Either way every
/// feed and the engine are told to stop and get `grace` to finish before
/// being aborted. Notifier loops are left running so shutdown alerts still
/// go out; [`close_notifiers`] ends them.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn supervise(
    engine: StrategyEngine,
    feeds: Vec<Box<dyn MarketDataStream>>,
    workers: &mut NotifierWorkers,
    registry: Arc<BookRegistry>,
    symbols: Vec<Symbol>,
    notifier: Arc<dyn Notifier>,
    grace: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks: JoinSet<TaskResult> = JoinSet::new();

    for feed in feeds {
        let name = format!("feed:{}", feed.venue());
        let registry = Arc::clone(&registry);
        let symbols = symbols.clone();
        let stop = stop_rx.clone();
        tasks.spawn(async move { (name, run_feed(feed, registry, symbols, stop).await) });
    }
    tasks.spawn(async move {
        engine.run(stop_rx).await;
        ("engine".to_string(), Ok(()))
    });

    let outcome = loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            }
            joined = tasks.join_next() => {
                let (task, reason) = match joined {
                    Some(Ok((task, Err(e)))) => (task, e.to_string()),
                    Some(Ok((task, Ok(())))) => (task, "exited unexpectedly".to_string()),
                    Some(Err(e)) => ("unknown".to_string(), e.to_string()),
                    None => ("runtime".to_string(), "no tasks left".to_string()),
                };
                break critical_failure(notifier.as_ref(), task, reason);
            }
            Some(finished) = workers.join_next(), if !workers.is_empty() => {
                let (task, reason) = match finished {
                    Ok(task) => (task, "exited unexpectedly".to_string()),
                    Err(e) => ("notifier".to_string(), e.to_string()),
                };
                break critical_failure(notifier.as_ref(), task, reason);
            }
        }
    };

    let _ = stop_tx.send(true);
    let drained = tokio::time::timeout(grace, async {
        while let Some(joined) = tasks.join_next().await {
            if let Ok((task, Err(e))) = joined {
                warn!(task = %task, error = %e, "Task ended with error during shutdown");
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!(grace_secs = grace.as_secs(), "Tasks did not stop in time, aborting");
        tasks.abort_all();
    }

    outcome
}

fn critical_failure(notifier: &dyn Notifier, task: String, reason: String) -> Result<()> {
    error!(task = %task, reason = %reason, "Critical task stopped");
    notifier.notify(Event::CriticalFailure {
        task: task.clone(),
        reason: reason.clone(),
    });
    Err(Error::TaskFailed { task, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::EngineSettings;
    use crate::application::pool::ProfitPool;
    use crate::infrastructure::exchange::ReconnectingStream;
    use crate::testkit::gateway::ScriptedGateway;
    use crate::testkit::sink::{MemoryRecorder, RecordingNotifier};
    use crate::testkit::stream::ScriptedStream;

    fn engine(registry: &Arc<BookRegistry>, notifier: Arc<RecordingNotifier>) -> StrategyEngine {
        StrategyEngine::new(
            Arc::clone(registry),
            Arc::new(ScriptedGateway::new()),
            notifier,
            Arc::new(MemoryRecorder::new()),
            Arc::new(ProfitPool::new(1)),
            EngineSettings::default(),
        )
    }

    fn idle_feed(venue: &str) -> Box<dyn MarketDataStream> {
        Box::new(ReconnectingStream::new(
            ScriptedStream::new().with_venue(venue),
            Duration::from_secs(3600),
        ))
    }

    #[tokio::test]
    async fn ended_feed_is_a_critical_failure() {
        let registry = Arc::new(BookRegistry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (_tx, rx) = watch::channel(false);

        let result = supervise(
            engine(&registry, Arc::clone(&notifier)),
            vec![
                Box::new(ScriptedStream::new().with_venue("okx")),
                idle_feed("binance"),
            ],
            &mut JoinSet::new(),
            registry,
            vec![Symbol::from("BTC/USDT")],
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Duration::from_secs(1),
            rx,
        )
        .await;

        match result {
            Err(Error::TaskFailed { task, .. }) => assert_eq!(task, "feed:okx"),
            other => panic!("expected task failure, got {other:?}"),
        }
        assert!(notifier
            .events()
            .iter()
            .any(|e| matches!(e, Event::CriticalFailure { task, .. } if task == "feed:okx")));
    }

    #[tokio::test]
    async fn external_shutdown_stops_every_task() {
        let registry = Arc::new(BookRegistry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let notifier_for_task = Arc::clone(&notifier);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut workers = JoinSet::new();
            supervise(
                engine(&registry, Arc::clone(&notifier_for_task)),
                vec![idle_feed("binance"), idle_feed("okx")],
                &mut workers,
                registry,
                vec![Symbol::from("BTC/USDT")],
                notifier_for_task as Arc<dyn Notifier>,
                Duration::from_secs(1),
                rx,
            )
            .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        assert!(handle.await.unwrap().is_ok());
        assert!(!notifier
            .events()
            .iter()
            .any(|e| matches!(e, Event::CriticalFailure { .. })));
    }

    #[tokio::test]
    async fn stopped_notifier_loop_is_a_critical_failure() {
        let registry = Arc::new(BookRegistry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (_tx, rx) = watch::channel(false);
        let mut workers = JoinSet::new();
        workers.spawn(async { "notifier:telegram".to_string() });

        let result = supervise(
            engine(&registry, Arc::clone(&notifier)),
            vec![idle_feed("binance"), idle_feed("okx")],
            &mut workers,
            registry,
            vec![Symbol::from("BTC/USDT")],
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Duration::from_secs(1),
            rx,
        )
        .await;

        match result {
            Err(Error::TaskFailed { task, .. }) => assert_eq!(task, "notifier:telegram"),
            other => panic!("expected task failure, got {other:?}"),
        }
        assert!(notifier
            .events()
            .iter()
            .any(|e| matches!(e, Event::CriticalFailure { task, .. } if task == "notifier:telegram")));
    }

    /// Queue-backed notifier whose loop delivers one event per second.
    struct PacedNotifier {
        queue: parking_lot::Mutex<Option<tokio::sync::mpsc::UnboundedSender<Event>>>,
    }

    impl Notifier for PacedNotifier {
        fn notify(&self, event: Event) {
            if let Some(queue) = self.queue.lock().as_ref() {
                let _ = queue.send(event);
            }
        }

        fn close(&self) {
            self.queue.lock().take();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn closing_waits_for_queued_alerts() {
        let (queue, mut pending) = tokio::sync::mpsc::unbounded_channel();
        let notifier = PacedNotifier {
            queue: parking_lot::Mutex::new(Some(queue)),
        };
        let delivered = Arc::new(RecordingNotifier::new());
        let sink = Arc::clone(&delivered);
        let mut workers = JoinSet::new();
        workers.spawn(async move {
            while let Some(event) = pending.recv().await {
                tokio::time::sleep(Duration::from_secs(1)).await;
                sink.notify(event);
            }
            "notifier:paced".to_string()
        });

        notifier.notify(Event::CriticalFailure {
            task: "feed:okx".into(),
            reason: "stream ended".into(),
        });
        notifier.notify(Event::Shutdown);
        close_notifiers(&notifier, &mut workers, Duration::from_secs(5)).await;

        let events = delivered.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::Shutdown));
        assert!(workers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_notifier_loop_is_aborted_after_grace() {
        let notifier = RecordingNotifier::new();
        let mut workers = JoinSet::new();
        workers.spawn(async {
            std::future::pending::<()>().await;
            "notifier:stuck".to_string()
        });

        close_notifiers(&notifier, &mut workers, Duration::from_secs(2)).await;
        assert!(notifier.is_closed());
        while let Some(joined) = workers.join_next().await {
            assert!(joined.unwrap_err().is_cancelled());
        }
    }
}
