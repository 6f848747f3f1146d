//! Feed task: pump one venue's depth stream into the book registry.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::registry::BookRegistry;
use crate::domain::id::Symbol;
use crate::error::{Error, Result};
use crate::port::{MarketDataStream, MarketEvent};

/// Connect, subscribe and apply deltas until shutdown or the stream ends.
///
/// A failed initial connect is logged and left to the stream's own retry
/// logic. Returns an error if the stream ends, which for a reconnecting
/// stream only happens when the venue is gone for good.
pub(crate) async fn run_feed(
    mut stream: Box<dyn MarketDataStream>,
    registry: Arc<BookRegistry>,
    symbols: Vec<Symbol>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let venue = stream.venue().clone();

    if let Err(e) = stream.connect().await {
        warn!(venue = %venue, error = %e, "Initial connect failed, retrying in background");
    }
    stream.subscribe(&symbols).await?;
    info!(venue = %venue, symbols = symbols.len(), "Feed subscribed");

    let mut applied: u64 = 0;
    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(venue = %venue, applied, "Feed stopping");
                    return Ok(());
                }
            }
            event = stream.next_event() => match event {
                Some(MarketEvent::Depth(delta)) => {
                    if registry.apply_delta(&delta).is_ok() {
                        applied += 1;
                    }
                }
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(venue = %venue, reason = %reason, "Feed disconnected");
                }
                None => {
                    return Err(Error::TaskFailed {
                        task: format!("feed:{venue}"),
                        reason: "stream ended".into(),
                    });
                }
            }
        }
    }
}
