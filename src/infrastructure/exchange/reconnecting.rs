//! Reconnecting wrapper for [`MarketDataStream`].
//!
//! Disconnects and stream ends never reach the caller: the wrapper waits a
//! fixed delay, reconnects, resubscribes to the tracked symbols and keeps
//! going. Retries are unbounded; a venue that stays down only costs one
//! connection attempt per delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::id::{Symbol, VenueId};
use crate::error::Error;
use crate::port::{MarketDataStream, MarketEvent};

pub struct ReconnectingStream<S: MarketDataStream> {
    inner: S,
    delay: Duration,
    symbols: Vec<Symbol>,
    connected: bool,
    attempts: u32,
}

impl<S: MarketDataStream> ReconnectingStream<S> {
    /// Wrap `inner`. Call [`connect`](MarketDataStream::connect) before
    /// reading events.
    pub fn new(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            symbols: Vec::new(),
            connected: false,
            attempts: 0,
        }
    }

    /// Consecutive failed reconnection attempts since the last event.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    async fn reconnect(&mut self) -> Result<(), Error> {
        self.attempts += 1;
        info!(
            venue = %self.inner.venue(),
            delay_ms = self.delay.as_millis(),
            attempt = self.attempts,
            "Reconnecting after delay"
        );
        sleep(self.delay).await;

        self.inner.connect().await?;
        if !self.symbols.is_empty() {
            debug!(venue = %self.inner.venue(), symbols = self.symbols.len(), "Resubscribing");
            self.inner.subscribe(&self.symbols).await?;
        }
        info!(venue = %self.inner.venue(), "Reconnected");
        self.connected = true;
        Ok(())
    }
}

#[async_trait]
impl<S: MarketDataStream> MarketDataStream for ReconnectingStream<S> {
    async fn connect(&mut self) -> Result<(), Error> {
        self.inner.connect().await?;
        self.connected = true;
        self.attempts = 0;
        Ok(())
    }

    /// While disconnected the symbols are only remembered; they are sent on
    /// the next reconnect.
    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), Error> {
        self.symbols = symbols.to_vec();
        if !self.connected {
            return Ok(());
        }
        self.inner.subscribe(symbols).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if !self.connected {
                if let Err(e) = self.reconnect().await {
                    warn!(venue = %self.inner.venue(), error = %e, "Reconnection failed, will retry");
                    continue;
                }
            }

            match self.inner.next_event().await {
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(venue = %self.inner.venue(), reason = %reason, "Connection lost");
                    self.connected = false;
                }
                Some(event) => {
                    self.attempts = 0;
                    return Some(event);
                }
                None => {
                    warn!(venue = %self.inner.venue(), "Stream ended, will reconnect");
                    self.connected = false;
                }
            }
        }
    }

    fn venue(&self) -> &VenueId {
        self.inner.venue()
    }
}
