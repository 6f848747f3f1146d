//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! - [`stream`]: `ScriptedStream`, a mock [`MarketDataStream`](crate::port::MarketDataStream).
//! - [`gateway`]: `ScriptedGateway`, an in-memory [`ExecutionGateway`](crate::port::ExecutionGateway).
//! - [`sink`]: `MemoryRecorder` and `RecordingNotifier`.
//! - [`domain`]: builders for levels, deltas and events.

pub mod domain;
pub mod gateway;
pub mod sink;
pub mod stream;
