//! Report Scenarios - Known Trade Histories Through the Calculators
//!
//! Feeds hand-built fill sequences with known outcomes through the
//! metric calculator, the portfolio rows and the renderers, then checks
//! the figures a user would read.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use strategy_analytics::adapters::render;
use strategy_analytics::domain::metrics::{MetricCalculator, PerformanceMetrics, PricingContext};
use strategy_analytics::domain::portfolio::PortfolioRow;
use strategy_analytics::domain::report::{AggregatedReport, FullReport, Report, ReportWindow};
use strategy_analytics::domain::trade::{BalanceSnapshot, TradeFee, TradeFill, TradeSide};

/// A fill sequence with the balances observed after it.
struct Scenario {
    market: &'static str,
    symbol: &'static str,
    fills: Vec<TradeFill>,
    balances: BalanceSnapshot,
}

impl Scenario {
    fn run(&self) -> PerformanceMetrics {
        MetricCalculator::default()
            .calculate(
                self.market,
                self.symbol,
                &self.fills,
                &self.balances,
                0,
                &PricingContext::default(),
            )
            .unwrap()
    }
}

fn fill(
    market: &str,
    symbol: &str,
    side: TradeSide,
    price: Decimal,
    amount: Decimal,
    ts: i64,
) -> TradeFill {
    TradeFill {
        market: market.to_string(),
        symbol: symbol.to_string(),
        strategy_id: "conf_pure_mm_1.yml".to_string(),
        side,
        price,
        amount,
        fee: TradeFee::none(),
        timestamp_ms: ts,
        order_id: None,
        exchange_trade_id: None,
    }
}

fn balances(entries: &[(&str, Decimal)]) -> BalanceSnapshot {
    entries
        .iter()
        .map(|(token, amount)| ((*token).to_string(), *amount))
        .collect()
}

fn window() -> ReportWindow {
    ReportWindow::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap(),
    )
}

/// Two buys and a sell on one market.
fn scenario_a() -> Scenario {
    Scenario {
        market: "binance",
        symbol: "BTC-USDT",
        fills: vec![
            fill("binance", "BTC-USDT", TradeSide::Buy, dec!(100), dec!(1), 1),
            fill("binance", "BTC-USDT", TradeSide::Buy, dec!(110), dec!(1), 2),
            fill("binance", "BTC-USDT", TradeSide::Sell, dec!(120), dec!(1), 3),
        ],
        balances: balances(&[("BTC", dec!(1)), ("USDT", dec!(790))]),
    }
}

#[test]
fn scenario_a_volumes_and_averages() {
    let perf = scenario_a().run();

    assert_eq!(perf.base_volume.buy, dec!(2));
    assert_eq!(perf.base_volume.sell, dec!(1));
    assert_eq!(perf.quote_volume.buy, dec!(210));
    assert_eq!(perf.quote_volume.sell, dec!(120));
    assert_eq!(perf.average_price.buy, Some(dec!(105)));
    assert_eq!(perf.average_price.sell, Some(dec!(120)));
}

#[test]
fn scenario_a_renders_as_json() {
    let report = Report::new(window(), vec![scenario_a().run()]);
    let doc = render::json::window_report(&report, None);

    assert_eq!(doc["duration"], "0 days 06:30:00");
    let market = &doc["markets"]["binance / BTC-USDT"];
    assert_eq!(market["number_of_trades"]["buy"], 2);
    assert_eq!(market["total_trade_volume"]["BTC"]["buy"], "2");
    assert_eq!(market["total_trade_volume"]["USDT"]["sell"], "120");
    assert_eq!(market["average_price"]["buy"], "105");
    assert_eq!(market["average_price"]["total"], "110");
    // single market: no averaged return
    assert!(doc.get("average_return").is_none());
}

#[test]
fn scenario_a_renders_as_text() {
    let report = Report::new(window(), vec![scenario_a().run()]);
    let text = render::text::window_report(&report, Some(2));

    assert!(text.starts_with("Start Time: 2024-03-01 00:00:00"));
    assert!(text.contains("binance / BTC-USDT"));
    assert!(text.contains("Number of trades"));
    assert!(text.contains("Return %"));
    assert!(!text.contains("Averaged Return"));
}

#[test]
fn multi_market_report_is_sorted_and_averaged() {
    let kucoin = Scenario {
        market: "kucoin",
        symbol: "ETH-USDT",
        fills: vec![fill("kucoin", "ETH-USDT", TradeSide::Buy, dec!(10), dec!(10), 1)],
        // start 0 ETH / 200 USDT; now 10 ETH worth 100
        balances: balances(&[("ETH", dec!(10)), ("USDT", dec!(100))]),
    };
    let kucoin_perf = kucoin.run();
    let binance_perf = scenario_a().run();
    assert_eq!(kucoin_perf.return_pct, Some(Decimal::ZERO));

    let report = Report::new(window(), vec![kucoin_perf, binance_perf.clone()]);
    let order: Vec<_> = report.markets.iter().map(|m| m.market.as_str()).collect();
    assert_eq!(order, vec!["binance", "kucoin"]);
    assert!(report.shows_average_return());
    assert_eq!(
        report.average_return,
        binance_perf.return_pct.map(|r| r / Decimal::TWO)
    );

    let doc = render::json::window_report(&report, None);
    assert!(doc.get("average_return").is_some());
}

#[test]
fn scenario_d_flat_position_row_is_kept() {
    let fills = vec![
        fill("gate_io", "ETH-USDT", TradeSide::Buy, dec!(100), dec!(3), 1),
        fill("gate_io", "ETH-USDT", TradeSide::Sell, dec!(105), dec!(1), 2),
        fill("gate_io", "ETH-USDT", TradeSide::Sell, dec!(110), dec!(2), 3),
    ];
    let row = PortfolioRow::compute("conf_pure_mm_1.yml", &fills, None).unwrap();

    assert_eq!(row.accumulation_distribution.total_holdings, Decimal::ZERO);
    assert_eq!(row.accumulation_distribution.average_cost_basis, None);
    assert_eq!(row.profit_performance.unrealized_pnl, None);
    // 105 + 220 − 300
    assert_eq!(row.profit_performance.realized_pnl, dec!(25));

    let report = FullReport::Ok(AggregatedReport {
        window: window(),
        markets: vec![row],
        unique_strategies: vec!["conf_pure_mm_1.yml".to_string()],
        unique_markets: vec!["gate_io".to_string()],
        strategies_by_market: [(
            "gate_io".to_string(),
            vec!["conf_pure_mm_1.yml".to_string()],
        )]
        .into_iter()
        .collect(),
    });
    let doc = render::json::full_report(&report);
    let rows = doc["markets"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["accumulation_distribution"]["average_cost_basis"], "N/A");
    assert_eq!(rows[0]["profit_performance"]["unrealized_pnl"], "N/A");
    assert!(doc.get("error").is_none());
}

#[test]
fn window_duration_spans_days() {
    let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 4, 13, 5, 9).unwrap();
    let report = Report::new(ReportWindow::new(start, now), vec![scenario_a().run()]);
    let doc = render::json::window_report(&report, None);
    assert_eq!(doc["duration"], "3 days 01:05:09");
}
