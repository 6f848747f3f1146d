//! Handler for the `trades` command.

use super::command::TradesArgs;
use super::output;
use crate::adapter::outbound::sqlite::SqliteJournal;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Print the most recent journal entries, newest first.
pub fn execute(args: &TradesArgs) -> Result<()> {
    let config = Config::load(&args.config.config)?;
    let journal = SqliteJournal::open(&config.database)?;
    let records = journal.recent(args.limit.max(1))?;

    output::section("Recent Trades");
    if records.is_empty() {
        output::field("Trades", "none recorded");
        return Ok(());
    }

    for record in records {
        let profit = record
            .profit_usd
            .map_or_else(|| "-".to_string(), |p| format!("${p}"));
        output::field(
            &record.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!(
                "{} {} {}→{} vol {} @ {}/{} profit {}",
                record.kind,
                record.symbol,
                record.buy_venue,
                record.sell_venue,
                record.volume,
                record.buy_price,
                record.sell_price,
                profit
            ),
        );
    }
    Ok(())
}
