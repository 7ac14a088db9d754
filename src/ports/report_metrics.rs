//! Report Metrics Port - Observability Sink for Report Activity
//!
//! Use cases record what they did through this trait; the Prometheus
//! adapter implements it. Calls are synchronous and must not block.

use std::time::Duration;

use rust_decimal::Decimal;

/// Which entry point produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
  Window,
  Full,
  Profitability,
  RecentTrades,
}

impl ReportKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Window => "window",
      Self::Full => "full",
      Self::Profitability => "profitability",
      Self::RecentTrades => "recent_trades",
    }
  }
}

pub trait ReportMetrics: Send + Sync + 'static {
  /// A report finished successfully.
  fn report_completed(&self, kind: ReportKind, latency: Duration);

  /// A report failed; `reason` is a short stable label.
  fn report_failed(&self, kind: ReportKind, reason: &str);

  /// Latest averaged return of a scope. `None` clears the gauge.
  fn average_return(&self, scope: &str, value: Option<Decimal>);

  /// The kill switch fired.
  fn kill_switch_triggered(&self);
}

/// Discards everything. Used when metrics are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReportMetrics;

impl ReportMetrics for NoopReportMetrics {
  fn report_completed(&self, _kind: ReportKind, _latency: Duration) {}

  fn report_failed(&self, _kind: ReportKind, _reason: &str) {}

  fn average_return(&self, _scope: &str, _value: Option<Decimal>) {}

  fn kill_switch_triggered(&self) {}
}
