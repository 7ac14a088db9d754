//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `TradeRecordSource`: Recorded fills and the balance log
//! - `BalanceSource`: Current holdings per market
//! - `PriceOracle`: Current rate of a trading pair
//! - `ReportMetrics`: Observability sink for report activity

pub mod balance_source;
pub mod price_oracle;
pub mod report_metrics;
pub mod trade_source;

pub use balance_source::BalanceSource;
pub use price_oracle::PriceOracle;
pub use report_metrics::{NoopReportMetrics, ReportKind, ReportMetrics};
pub use trade_source::TradeRecordSource;
