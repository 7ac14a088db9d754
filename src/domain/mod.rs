//! Domain layer - Trade log types and the pure analytics calculators.
//!
//! Nothing in here performs I/O (hexagonal architecture inner ring).
//! Balances, prices and trades arrive as plain values; every type is
//! serializable and testable in isolation.

pub mod error;
pub mod fees;
pub mod format;
pub mod metrics;
pub mod portfolio;
pub mod report;
pub mod safe_math;
pub mod trade;

// Re-export core types for convenience
pub use error::AnalyticsError;
pub use fees::FeeLedger;
pub use metrics::{MetricCalculator, PerformanceMetrics, PricingContext};
pub use portfolio::PortfolioRow;
pub use report::{AggregatedReport, FullReport, Report, ReportFailure, ReportWindow};
pub use trade::{
    BalanceBounds, BalanceSnapshot, DerivativeMarkets, MarketId, RecordedBalance, StrategyId,
    Token, TradeFee, TradeFill, TradeSide, TradingPair,
};
