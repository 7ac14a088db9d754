//! Analytics Benchmarks — Report Calculator Throughput
//!
//! Benchmarks the pure calculators that every report runs once per
//! (market, pair) scope or per strategy run.
//!
//! Run with: cargo bench --bench analytics_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

use strategy_analytics::domain::fees::FeeLedger;
use strategy_analytics::domain::format::smart_round;
use strategy_analytics::domain::metrics::{MetricCalculator, PricingContext};
use strategy_analytics::domain::portfolio::PortfolioRow;
use strategy_analytics::domain::trade::{
    BalanceSnapshot, TradeFee, TradeFill, TradeSide, TradingPair,
};

/// A day of alternating fills around 30 000.
fn synthetic_fills(n: i64) -> Vec<TradeFill> {
    (0..n)
        .map(|i| TradeFill {
            market: "binance".to_string(),
            symbol: "BTC-USDT".to_string(),
            strategy_id: "conf_pure_mm_1.yml".to_string(),
            side: if i % 2 == 0 { TradeSide::Buy } else { TradeSide::Sell },
            price: Decimal::new(3_000_000 + (i % 97) * 100, 2),
            amount: Decimal::new(1 + i % 9, 3),
            fee: TradeFee::percent(Decimal::new(1, 3)),
            timestamp_ms: 1_700_000_000_000 + i * 86,
            order_id: None,
            exchange_trade_id: None,
        })
        .collect()
}

fn balances() -> BalanceSnapshot {
    [
        ("BTC".to_string(), Decimal::new(5, 1)),
        ("USDT".to_string(), Decimal::new(1_000_000, 2)),
    ]
    .into_iter()
    .collect()
}

/// Benchmark the window-report calculator over 1 000 fills.
fn bench_metric_calculator(c: &mut Criterion) {
    let fills = synthetic_fills(1_000);
    let snapshot = balances();
    let pricing = PricingContext::default();
    let calculator = MetricCalculator::default();

    c.bench_function("metric_calculator_1000_fills", |b| {
        b.iter(|| {
            let _perf = calculator.calculate(
                black_box("binance"),
                black_box("BTC-USDT"),
                black_box(&fills),
                &snapshot,
                0,
                &pricing,
            );
        });
    });
}

/// Benchmark one cross-portfolio row over 1 000 fills.
fn bench_portfolio_row(c: &mut Criterion) {
    let fills = synthetic_fills(1_000);

    c.bench_function("portfolio_row_1000_fills", |b| {
        b.iter(|| {
            let _row = PortfolioRow::compute(black_box("conf_pure_mm_1.yml"), black_box(&fills), None);
        });
    });
}

/// Benchmark fee aggregation.
fn bench_fee_ledger(c: &mut Criterion) {
    let fills = synthetic_fills(1_000);
    let pair = TradingPair {
        base: "BTC".to_string(),
        quote: "USDT".to_string(),
    };

    c.bench_function("fee_ledger_1000_fills", |b| {
        b.iter(|| {
            let _ledger = FeeLedger::from_fills(black_box(&fills), &pair);
        });
    });
}

/// Benchmark display rounding.
fn bench_smart_round(c: &mut Criterion) {
    let value = Decimal::new(123_456_789, 7);

    c.bench_function("smart_round_default", |b| {
        b.iter(|| {
            let _rounded = smart_round(black_box(value), None);
        });
    });
}

criterion_group!(
    benches,
    bench_metric_calculator,
    bench_portfolio_row,
    bench_fee_ledger,
    bench_smart_round,
);
criterion_main!(benches);
