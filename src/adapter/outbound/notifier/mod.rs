//! Alert delivery backends. The log notifier lives with the port; Telegram
//! is behind the `telegram` feature.

#[cfg(feature = "telegram")]
pub mod telegram;
