//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   feeds ──────▶ │  BookRegistry            │
//!                 │  StrategyEngine          │ ──▶ ExecutionGateway
//!                 │  (application + domain)  │ ──▶ Notifier
//!                 └──────────────────────────┘ ──▶ TradeRecorder
//! ```

pub mod outbound;

pub use outbound::exchange::{
    ExecutionGateway, FeeSchedule, LimitOrder, MarketDataStream, MarketEvent,
};
pub use outbound::notifier::{Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier, Route};
pub use outbound::recorder::{NullRecorder, TradeRecorder};
