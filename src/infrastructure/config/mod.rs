//! Infrastructure configuration modules.

pub mod logging;
pub mod pool;
pub mod risk;
pub mod settings;
pub mod strategy;
pub mod telegram;
pub mod venue;
