//! Outbound ports: what the engine needs from venues, alerting and storage.

pub mod exchange;
pub mod notifier;
pub mod recorder;
