//! Telegram notifications.
//!
//! Events are formatted as `MarkdownV2` and delivered by a background
//! worker, at most one message per configured interval.

mod format;
mod notifier;

pub use format::{escape_markdown, format_event_message};
pub use notifier::{TelegramConfig, TelegramNotifier};
