//! Telegram delivery: a queue in front of a paced background sender.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::format::format_event_message;
use crate::port::{Event, Notifier};

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    /// Also send every taker opportunity (noisy).
    pub notify_opportunities: bool,
    /// Minimum gap between two messages.
    pub min_interval: Duration,
}

impl TelegramConfig {
    /// Credentials come from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    /// `None` if either is unset or the chat id is not numeric.
    #[must_use]
    pub fn from_env(notify_opportunities: bool, min_interval: Duration) -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?.trim().parse().ok()?;
        Some(Self {
            bot_token,
            chat_id,
            notify_opportunities,
            min_interval,
        })
    }
}

/// [`Notifier`] that hands events to a background sender. `notify` never
/// waits on the network.
pub struct TelegramNotifier {
    queue: Mutex<Option<mpsc::UnboundedSender<Event>>>,
}

impl TelegramNotifier {
    /// Build the notifier and the delivery loop behind it.
    ///
    /// The loop is returned rather than spawned so the caller can supervise
    /// it. It runs until [`Notifier::close`] is called, then sends whatever
    /// is still queued and returns.
    pub fn new(config: TelegramConfig) -> (Self, impl Future<Output = ()> + Send + 'static) {
        let (queue, pending) = mpsc::unbounded_channel();
        let worker = async move { Sender::new(&config).run(pending).await };
        (
            Self {
                queue: Mutex::new(Some(queue)),
            },
            worker,
        )
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, event: Event) {
        match self.queue.lock().as_ref() {
            Some(queue) => {
                if queue.send(event).is_err() {
                    warn!("Telegram sender stopped, dropping event");
                }
            }
            None => debug!("Telegram notifier closed, dropping event"),
        }
    }

    fn close(&self) {
        self.queue.lock().take();
    }
}

struct Sender {
    bot: Bot,
    chat: ChatId,
    notify_opportunities: bool,
    pace: Interval,
}

impl Sender {
    fn new(config: &TelegramConfig) -> Self {
        let mut pace = interval(config.min_interval);
        pace.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            bot: Bot::new(&config.bot_token),
            chat: ChatId(config.chat_id),
            notify_opportunities: config.notify_opportunities,
            pace,
        }
    }

    async fn run(mut self, mut pending: mpsc::UnboundedReceiver<Event>) {
        info!(chat_id = self.chat.0, "Telegram sender started");
        while let Some(event) = pending.recv().await {
            if let Some(text) = format_event_message(&event, self.notify_opportunities) {
                self.send(&text).await;
            }
        }
        info!("Telegram queue drained, sender stopped");
    }

    async fn send(&mut self, text: &str) {
        self.pace.tick().await;
        let result = self
            .bot
            .send_message(self.chat, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await;
        if let Err(e) = result {
            error!(error = %e, "Telegram send failed");
        }
    }
}
