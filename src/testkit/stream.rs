//! Mock [`MarketDataStream`] with scripted connect results and events.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::id::{Symbol, VenueId};
use crate::error::Result;
use crate::port::{MarketDataStream, MarketEvent};

/// Replays a script. Each `connect()` takes the next scripted result and
/// succeeds once they run out. Each `next_event()` takes the next scripted
/// entry; a `None` entry or an exhausted script ends the stream.
pub struct ScriptedStream {
    venue: VenueId,
    connects: VecDeque<Result<()>>,
    script: VecDeque<Option<MarketEvent>>,
    connected: Arc<AtomicU32>,
    subscribed: Arc<AtomicU32>,
    last_symbols: Arc<Mutex<Vec<Symbol>>>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            venue: VenueId::from("mock"),
            connects: VecDeque::new(),
            script: VecDeque::new(),
            connected: Arc::default(),
            subscribed: Arc::default(),
            last_symbols: Arc::default(),
        }
    }

    pub fn with_venue(mut self, venue: &str) -> Self {
        self.venue = VenueId::from(venue);
        self
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connects.extend(results);
        self
    }

    pub fn with_events(mut self, events: Vec<Option<MarketEvent>>) -> Self {
        self.script.extend(events);
        self
    }

    /// Shared connect and subscribe call counters, readable after the
    /// stream has been moved into a wrapper.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (Arc::clone(&self.connected), Arc::clone(&self.subscribed))
    }

    /// Symbols passed to the most recent `subscribe`.
    pub fn subscriptions(&self) -> Arc<Mutex<Vec<Symbol>>> {
        Arc::clone(&self.last_symbols)
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.connected.fetch_add(1, Ordering::SeqCst);
        self.connects.pop_front().unwrap_or(Ok(()))
    }

    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<()> {
        self.subscribed.fetch_add(1, Ordering::SeqCst);
        *self.last_symbols.lock() = symbols.to_vec();
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        self.script.pop_front().flatten()
    }

    fn venue(&self) -> &VenueId {
        &self.venue
    }
}
