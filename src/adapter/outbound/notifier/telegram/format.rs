//! Message formatting for Telegram notifications.

use rust_decimal::Decimal;

use crate::port::{Event, Route};

/// Format an event as a `MarkdownV2` message, or `None` if it is not sent.
pub fn format_event_message(event: &Event, notify_opportunities: bool) -> Option<String> {
    match event {
        Event::Startup { venues } => {
            let names: Vec<String> = venues.iter().map(ToString::to_string).collect();
            Some(format!(
                "🚀 *Engine Started*\n\nVenues: {}",
                escape_markdown(&names.join(", "))
            ))
        }
        Event::Shutdown => Some("⏹️ *Engine Stopped*".to_string()),
        Event::TakerOpportunity {
            route,
            volume,
            profit_usd,
            profit_pct,
        } if notify_opportunities => Some(format!(
            "🎯 *Taker Opportunity*\n\n{}\n💵 Volume: `{}`\n💰 Profit: `{}` \\({}%\\)",
            route_line(route),
            volume,
            money(*profit_usd),
            escape_markdown(&profit_pct.round_dp(4).to_string())
        )),
        Event::TradeAborted { route, reason } => Some(format!(
            "⚠️ *Trade Aborted*\n\n{}\n🚫 {}",
            route_line(route),
            escape_markdown(reason)
        )),
        Event::OrderFailed { route, reason } => Some(format!(
            "❌ *Order Failed*\n\n{}\n📝 {}",
            route_line(route),
            escape_markdown(reason)
        )),
        Event::MakerPlaced {
            route,
            buy_price,
            sell_price,
            amount,
        } => Some(format!(
            "📌 *Maker Orders Placed*\n\n{}\n🟢 Bid: `{}`\n🔴 Ask: `{}`\n📦 Amount: `{}`",
            route_line(route),
            buy_price,
            sell_price,
            amount
        )),
        Event::MakerCompleted { route, profit_usd } => Some(format!(
            "✅ *Maker Trade Completed*\n\n{}\n💰 Profit: `{}`",
            route_line(route),
            money(*profit_usd)
        )),
        Event::MakerChasing {
            route,
            venue,
            price,
            amount,
        } => Some(format!(
            "🏃 *Chasing Leg*\n\n{}\n🏦 {}: `{}` @ `{}`",
            route_line(route),
            escape_markdown(venue.as_str()),
            amount,
            price
        )),
        Event::MakerReset { route, reason } => Some(format!(
            "🔄 *Maker Trade Reset*\n\n{}\n📝 {}",
            route_line(route),
            escape_markdown(reason)
        )),
        Event::CriticalFailure { task, reason } => Some(format!(
            "🛑 *Critical Failure*\n\n⚙️ {}\n📝 {}",
            escape_markdown(task),
            escape_markdown(reason)
        )),
        Event::TakerOpportunity { .. } => None,
    }
}

fn route_line(route: &Route) -> String {
    format!(
        "📋 {} → {} `{}`",
        escape_markdown(route.buy_venue.as_str()),
        escape_markdown(route.sell_venue.as_str()),
        route.symbol
    )
}

/// Signed dollar amount, rendered inside a code span.
fn money(value: Decimal) -> String {
    let rounded = value.round_dp(4);
    if rounded.is_sign_negative() {
        format!("-${}", rounded.abs())
    } else {
        format!("+${rounded}")
    }
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{Symbol, VenueId};
    use rust_decimal_macros::dec;

    fn route() -> Route {
        Route::new(&VenueId::from("binance"), &VenueId::from("okx"), &Symbol::from("BTC/USDT"))
    }

    #[test]
    fn escapes_markdown_specials() {
        assert_eq!(escape_markdown("hello"), "hello");
        assert_eq!(escape_markdown("hello_world"), "hello\\_world");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("1.5 (ok)"), "1\\.5 \\(ok\\)");
    }

    #[test]
    fn opportunities_are_opt_in() {
        let event = Event::TakerOpportunity {
            route: route(),
            volume: dec!(0.1),
            profit_usd: dec!(0.25),
            profit_pct: dec!(0.125),
        };
        assert!(format_event_message(&event, false).is_none());

        let text = format_event_message(&event, true).unwrap();
        assert!(text.contains("+$0.25"));
        assert!(text.contains("0\\.125%"));
    }

    #[test]
    fn reasons_are_escaped() {
        let event = Event::TradeAborted {
            route: route(),
            reason: "insufficient USDT (have 1.0)".into(),
        };
        let text = format_event_message(&event, false).unwrap();
        assert!(text.contains("insufficient USDT \\(have 1\\.0\\)"));
    }

    #[test]
    fn negative_profit_keeps_sign() {
        let event = Event::MakerCompleted {
            route: route(),
            profit_usd: dec!(-0.5),
        };
        assert!(format_event_message(&event, false).unwrap().contains("-$0.5"));
    }
}
