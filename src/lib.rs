//! Crossarb - cross-venue crypto arbitrage.
//!
//! Streams order books from several venues, compares every venue pair for
//! the same symbol and trades the spread in one of two ways:
//!
//! - **Taker**: an immediate buy on the cheaper venue and sell on the dearer
//!   one, sized by walking both books.
//! - **Maker**: a pair of resting limit orders one tick inside the spread,
//!   monitored until both fill, one fill is chased, or the pair is reset.
//!
//! # Modules
//!
//! - [`domain`] - Order books, pricing, opportunities and the maker state
//! - [`application`] - Book registry, profit pool and the strategy engine
//! - [`port`] - Traits the engine needs from venues, alerting and storage
//! - [`adapter`] - CLI, venue feeds, paper gateway, Telegram and SQLite
//! - [`infrastructure`] - Configuration, reconnection and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `telegram` - Telegram notifications (default)
//! - `testkit` - Scripted gateways, streams and sinks for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
