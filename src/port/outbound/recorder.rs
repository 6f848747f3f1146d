//! Trade journal port.

use async_trait::async_trait;

use crate::domain::journal::TradeRecord;

/// Append-only sink for trade lifecycle records.
#[async_trait]
pub trait TradeRecorder: Send + Sync {
    /// Queue a record. Never blocks on storage and never fails the caller.
    fn record(&self, record: TradeRecord);

    /// Resolve once every record queued before this call is durable.
    async fn flush(&self);
}

/// Recorder that drops everything.
pub struct NullRecorder;

#[async_trait]
impl TradeRecorder for NullRecorder {
    fn record(&self, _record: TradeRecord) {}

    async fn flush(&self) {}
}
