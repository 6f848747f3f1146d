//! Exchange-agnostic trading types and pure pricing logic.

pub mod book;
pub mod id;
pub mod journal;
pub mod money;
pub mod opportunity;
pub mod profit;
pub mod trade;
