//! Application services: book synchronization, profit offload and the
//! strategy engine.

pub mod engine;
pub mod pool;
pub mod registry;
pub mod taker;
