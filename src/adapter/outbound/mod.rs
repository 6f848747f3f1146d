//! Outbound adapters (driven side).

pub mod notifier;
pub mod paper;
pub mod sqlite;
pub mod venue;
