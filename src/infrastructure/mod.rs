//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`exchange`] - Stream reconnection
//! - [`orchestration`] - Task supervision and shutdown

pub mod bootstrap;
pub mod config;
pub mod exchange;
pub mod orchestration;
