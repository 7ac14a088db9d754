//! Plain-text tables for the CLI `history` command.

use comfy_table::presets::NOTHING;
use comfy_table::Table;

use crate::domain::format::{format_duration, format_pct, format_pct_or_na, round_or_na, smart_round};
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::report::Report;
use crate::usecases::window_report::RecentTrades;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn table() -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table
}

fn indent(block: &str, prefix: &str) -> String {
    block
        .lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header with the report window.
pub fn header(report: &Report) -> String {
    format!(
        "Start Time: {}\nCurrent Time: {}\nDuration: {}",
        report.window.start_time.format(TIME_FORMAT),
        report.window.current_time.format(TIME_FORMAT),
        format_duration(report.window.duration()),
    )
}

/// Full window report: header, one block per market, averaged return.
pub fn window_report(report: &Report, precision: Option<u32>) -> String {
    let mut out = header(report);
    for perf in &report.markets {
        out.push_str("\n\n");
        out.push_str(&market_block(perf, precision));
    }
    if report.shows_average_return() {
        out.push_str(&format!(
            "\n\nAveraged Return = {}",
            format_pct_or_na(report.average_return)
        ));
    }
    out
}

/// Trades, assets and performance tables of one market.
pub fn market_block(perf: &PerformanceMetrics, precision: Option<u32>) -> String {
    let round = |v| smart_round(v, precision).to_string();
    let (base, quote) = (&perf.base_token, &perf.quote_token);

    let mut trades = table();
    trades.set_header(vec!["", "buy", "sell", "total"]);
    trades.add_row(vec![
        "Number of trades".to_string(),
        perf.trades.buy.to_string(),
        perf.trades.sell.to_string(),
        perf.trades.total.to_string(),
    ]);
    trades.add_row(vec![
        format!("Total trade volume ({base})"),
        round(perf.base_volume.buy),
        round(perf.base_volume.sell),
        round(perf.base_volume.total),
    ]);
    trades.add_row(vec![
        format!("Total trade volume ({quote})"),
        round(perf.quote_volume.buy),
        round(perf.quote_volume.sell),
        round(perf.quote_volume.total),
    ]);
    trades.add_row(vec![
        "Avg price".to_string(),
        round_or_na(perf.average_price.buy, precision),
        round_or_na(perf.average_price.sell, precision),
        round_or_na(perf.average_price.total, precision),
    ]);

    let mut assets = table();
    assets.set_header(vec!["", "start", "current", "change"]);
    match (perf.start_base_balance, perf.current_base_balance) {
        (Some(start), Some(current)) => assets.add_row(vec![
            base.clone(),
            round(start),
            round(current),
            round(perf.net_base_change),
        ]),
        _ => assets.add_row(vec![base.as_str(), "-", "-", "-"]),
    };
    assets.add_row(vec![
        quote.clone(),
        round(perf.start_quote_balance),
        round(perf.current_quote_balance),
        round(perf.net_quote_change),
    ]);
    assets.add_row(vec![
        format!("{} price", perf.trading_pair),
        smart_round(perf.start_price, None).to_string(),
        smart_round(perf.current_price, None).to_string(),
        smart_round(perf.current_price - perf.start_price, None).to_string(),
    ]);
    match (perf.start_base_ratio, perf.current_base_ratio) {
        (Some(start), Some(current)) => assets.add_row(vec![
            "Base asset %".to_string(),
            format_pct(start),
            format_pct(current),
            format_pct(current - start),
        ]),
        _ => assets.add_row(vec!["Base asset %", "-", "-", "-"]),
    };

    let mut performance = table();
    performance.add_row(vec![
        "Hold portfolio value".to_string(),
        format!("{} {quote}", round(perf.hold_value)),
    ]);
    performance.add_row(vec![
        "Current portfolio value".to_string(),
        format!("{} {quote}", round(perf.current_value)),
    ]);
    performance.add_row(vec![
        "Trade P&L".to_string(),
        format!("{} {quote}", round(perf.trade_pnl)),
    ]);
    for (token, amount) in perf.fees.iter() {
        performance.add_row(vec![
            "Fees paid".to_string(),
            format!("{} {token}", round(*amount)),
        ]);
    }
    if !perf.unpriced_fee_tokens.is_empty() {
        performance.add_row(vec![
            "Unpriced fee tokens".to_string(),
            perf.unpriced_fee_tokens.join(", "),
        ]);
    }
    performance.add_row(vec![
        "Total P&L".to_string(),
        format!("{} {quote}", round(perf.total_pnl)),
    ]);
    performance.add_row(vec![
        "Return %".to_string(),
        format_pct_or_na(perf.return_pct),
    ]);

    format!(
        "{} / {}\n\n  Trades:\n{}\n\n  Assets:\n{}\n\n  Performance:\n{}",
        perf.market,
        perf.trading_pair,
        indent(&trades.to_string(), "    "),
        indent(&assets.to_string(), "    "),
        indent(&performance.to_string(), "    "),
    )
}

/// Recent trades listing, newest first.
pub fn recent_trades(recent: &RecentTrades) -> String {
    if recent.trades.is_empty() {
        return "  No past trades in this session.".to_string();
    }

    let mut trades = table();
    trades.set_header(vec!["timestamp", "market", "symbol", "side", "price", "amount", "order_id"]);
    for fill in &recent.trades {
        let time = chrono::DateTime::from_timestamp_millis(fill.timestamp_ms)
            .map_or_else(|| fill.timestamp_ms.to_string(), |t| t.format(TIME_FORMAT).to_string());
        trades.add_row(vec![
            time,
            fill.market.clone(),
            fill.symbol.clone(),
            fill.side.to_string(),
            fill.price.to_string(),
            fill.amount.to_string(),
            fill.order_id.clone().unwrap_or_default(),
        ]);
    }

    let mut out = String::from("  Recent trades:\n");
    out.push_str(&indent(&trades.to_string(), "    "));
    if recent.truncated {
        out.push_str(&format!(
            "\n\n  Showing last {} trades in the current session.",
            recent.trades.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{MetricCalculator, PricingContext};
    use crate::domain::report::ReportWindow;
    use crate::domain::trade::{BalanceSnapshot, TradeFee, TradeFill, TradeSide};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn fill(side: TradeSide, price: rust_decimal::Decimal, ts: i64) -> TradeFill {
        TradeFill {
            market: "binance".to_string(),
            symbol: "BTC-USDT".to_string(),
            strategy_id: "conf_1.yml".to_string(),
            side,
            price,
            amount: dec!(1),
            fee: TradeFee::none(),
            timestamp_ms: ts,
            order_id: Some(format!("o{ts}")),
            exchange_trade_id: None,
        }
    }

    #[test]
    fn test_market_block_contains_sections() {
        let fills = vec![
            fill(TradeSide::Buy, dec!(100), 1),
            fill(TradeSide::Sell, dec!(120), 2),
        ];
        let balances: BalanceSnapshot = [("USDT".to_string(), dec!(1020))].into_iter().collect();
        let perf = MetricCalculator::default()
            .calculate("binance", "BTC-USDT", &fills, &balances, 0, &PricingContext::default())
            .unwrap();
        let now = Utc::now();
        let text = window_report(&Report::new(ReportWindow::new(now, now), vec![perf]), None);

        assert!(text.contains("binance / BTC-USDT"));
        assert!(text.contains("Number of trades"));
        assert!(text.contains("Return %"));
        assert!(!text.contains("Averaged Return"));
    }

    #[test]
    fn test_recent_trades_truncation_notice() {
        let recent = RecentTrades {
            trades: vec![fill(TradeSide::Buy, dec!(100), 2), fill(TradeSide::Buy, dec!(100), 1)],
            truncated: true,
        };
        let text = recent_trades(&recent);
        assert!(text.contains("Showing last 2 trades"));
        assert!(recent_trades(&RecentTrades { trades: vec![], truncated: false })
            .contains("No past trades"));
    }
}
