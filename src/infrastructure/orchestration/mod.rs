//! Runtime orchestration: feed tasks, engine task and their supervision.

mod runtime;
mod stream;

pub use runtime::run_with_shutdown;
