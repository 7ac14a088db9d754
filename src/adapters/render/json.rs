//! Structured JSON view of the window report.
//!
//! Figures are rounded with `smart_round` (or the caller's precision) and
//! written as strings. Portfolio values carry their quote-token suffix.
//! Fields that do not apply to derivative markets are written as `"-"`.

use serde_json::{json, Map, Value};

use crate::domain::format::{format_duration, format_pct_or_na, round_or_na, smart_round};
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::report::{FullReport, Report};
use crate::usecases::window_report::RecentTrades;

const NOT_APPLICABLE: &str = "-";

/// JSON document for a window report.
pub fn window_report(report: &Report, precision: Option<u32>) -> Value {
    let mut markets = Map::new();
    for perf in &report.markets {
        markets.insert(
            format!("{} / {}", perf.market, perf.trading_pair),
            market_section(perf, precision),
        );
    }

    let mut doc = json!({
        "start_time": report.window.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        "current_time": report.window.current_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        "duration": format_duration(report.window.duration()),
        "markets": markets,
    });
    if report.shows_average_return() {
        doc["average_return"] = Value::String(format_pct_or_na(report.average_return));
    }
    doc
}

/// JSON document for a full report.
pub fn full_report(report: &FullReport) -> Value {
    serde_json::to_value(report).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

/// JSON document for a recent-trades listing.
pub fn recent_trades(recent: &RecentTrades) -> Value {
    json!({
        "trades": recent.trades,
        "truncated": recent.truncated,
    })
}

fn market_section(perf: &PerformanceMetrics, precision: Option<u32>) -> Value {
    let round = |v| smart_round(v, precision).to_string();
    let (base, quote) = (&perf.base_token, &perf.quote_token);

    let mut volume = Map::new();
    volume.insert(
        base.clone(),
        json!({
            "buy": round(perf.base_volume.buy),
            "sell": round(perf.base_volume.sell),
            "total": round(perf.base_volume.total),
        }),
    );
    volume.insert(
        quote.clone(),
        json!({
            "buy": round(perf.quote_volume.buy),
            "sell": round(perf.quote_volume.sell),
            "total": round(perf.quote_volume.total),
        }),
    );

    let mut assets = Map::new();
    let base_assets = match (perf.start_base_balance, perf.current_base_balance) {
        (Some(start), Some(current)) => json!({
            "start": round(start),
            "current": round(current),
            "change": round(perf.net_base_change),
        }),
        _ => json!(NOT_APPLICABLE),
    };
    assets.insert(base.clone(), base_assets);
    assets.insert(
        quote.clone(),
        json!({
            "start": round(perf.start_quote_balance),
            "current": round(perf.current_quote_balance),
            "change": round(perf.net_quote_change),
        }),
    );
    assets.insert(
        "trading_pair_price".to_string(),
        json!({
            "start": round(perf.start_price),
            "current": round(perf.current_price),
            "change": round(perf.current_price - perf.start_price),
        }),
    );
    let ratio = if perf.is_derivative {
        json!(NOT_APPLICABLE)
    } else {
        json!({
            "start": format_pct_or_na(perf.start_base_ratio),
            "current": format_pct_or_na(perf.current_base_ratio),
            "change": format_pct_or_na(
                perf.current_base_ratio.zip(perf.start_base_ratio).map(|(c, s)| c - s)
            ),
        })
    };
    assets.insert("base_asset_percentage".to_string(), ratio);

    let fees: Map<String, Value> = perf
        .fees
        .iter()
        .map(|(token, amount)| (token.clone(), Value::String(round(*amount))))
        .collect();

    json!({
        "number_of_trades": {
            "buy": perf.trades.buy,
            "sell": perf.trades.sell,
            "total": perf.trades.total,
        },
        "total_trade_volume": volume,
        "average_price": {
            "buy": round_or_na(perf.average_price.buy, precision),
            "sell": round_or_na(perf.average_price.sell, precision),
            "total": round_or_na(perf.average_price.total, precision),
        },
        "assets": assets,
        "performance": {
            "hold_portfolio_value": format!("{} {quote}", round(perf.hold_value)),
            "current_portfolio_value": format!("{} {quote}", round(perf.current_value)),
            "trade_pnl": format!("{} {quote}", round(perf.trade_pnl)),
            "fees_paid": fees,
            "fees_in_quote": format!("{} {quote}", round(perf.fee_in_quote)),
            "unpriced_fee_tokens": perf.unpriced_fee_tokens,
            "total_pnl": format!("{} {quote}", round(perf.total_pnl)),
            "return_percentage": format_pct_or_na(perf.return_pct),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{MetricCalculator, PricingContext};
    use crate::domain::report::ReportWindow;
    use crate::domain::trade::{BalanceSnapshot, TradeFee, TradeFill, TradeSide};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn perf(market: &str) -> PerformanceMetrics {
        let fill = TradeFill {
            market: market.to_string(),
            symbol: "BTC-USDT".to_string(),
            strategy_id: "conf_1.yml".to_string(),
            side: TradeSide::Buy,
            price: dec!(100),
            amount: dec!(1),
            fee: TradeFee::percent(dec!(0.01)),
            timestamp_ms: 1,
            order_id: None,
            exchange_trade_id: None,
        };
        let balances: BalanceSnapshot = [
            ("BTC".to_string(), dec!(1)),
            ("USDT".to_string(), dec!(900)),
        ]
        .into_iter()
        .collect();
        MetricCalculator::default()
            .calculate(market, "BTC-USDT", &[fill], &balances, 0, &PricingContext::default())
            .unwrap()
    }

    #[test]
    fn test_window_report_sections() {
        let now = Utc::now();
        let report = Report::new(ReportWindow::new(now, now), vec![perf("binance")]);
        let doc = window_report(&report, None);
        let market = &doc["markets"]["binance / BTC-USDT"];

        assert_eq!(market["number_of_trades"]["buy"], 1);
        assert_eq!(market["average_price"]["sell"], "N/A");
        assert_eq!(market["assets"]["BTC"]["change"], "1");
        assert_eq!(market["performance"]["hold_portfolio_value"], "1000 USDT");
        assert_eq!(market["performance"]["fees_paid"]["USDT"], "1");
        // Single market: no average line.
        assert!(doc.get("average_return").is_none());
    }

    #[test]
    fn test_derivative_base_fields_are_dashes() {
        let now = Utc::now();
        let report = Report::new(
            ReportWindow::new(now, now),
            vec![perf("binance_perpetual"), perf("binance")],
        );
        let doc = window_report(&report, Some(2));
        let market = &doc["markets"]["binance_perpetual / BTC-USDT"];
        assert_eq!(market["assets"]["BTC"], "-");
        assert_eq!(market["assets"]["base_asset_percentage"], "-");
        assert!(doc.get("average_return").is_some());
    }
}
