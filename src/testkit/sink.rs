//! In-memory notifier and recorder that keep everything they receive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::journal::{TradeKind, TradeRecord};
use crate::port::{Event, Notifier, TradeRecorder};

/// Thread-safe event collector for notification assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Recorder that keeps records in memory and counts flushes.
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<TradeRecord>>>,
    flushes: Arc<Mutex<usize>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TradeRecord> {
        self.records.lock().clone()
    }

    pub fn kinds(&self) -> Vec<TradeKind> {
        self.records.lock().iter().map(|r| r.kind).collect()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }
}

#[async_trait]
impl TradeRecorder for MemoryRecorder {
    fn record(&self, record: TradeRecord) {
        self.records.lock().push(record);
    }

    async fn flush(&self) {
        *self.flushes.lock() += 1;
    }
}
