//! Telegram notification configuration.

use serde::Deserialize;

/// `[telegram]` section. Credentials come from `TELEGRAM_BOT_TOKEN` and
/// `TELEGRAM_CHAT_ID`, never from the file.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Send alerts to Telegram. Needs the environment credentials too.
    #[serde(default)]
    pub enabled: bool,
    /// Also alert on every taker opportunity (noisy).
    #[serde(default)]
    pub notify_opportunities: bool,
    /// Minimum gap between messages.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

const fn default_min_interval_ms() -> u64 {
    1000
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_opportunities: false,
            min_interval_ms: default_min_interval_ms(),
        }
    }
}
