//! Prometheus Metrics Registry - Report Observability
//!
//! Registers report counters, failure counters, latency histograms and
//! the averaged-return gauge. Exposed as text by the HTTP server's
//! `/metrics` route.

use std::time::Duration;

use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ports::report_metrics::{ReportKind, ReportMetrics};

/// Centralized Prometheus metrics for the analytics engine.
///
/// All metrics follow the naming convention `analytics_*`.
pub struct MetricsRegistry {
    registry: Registry,
    /// Completed reports by kind.
    pub reports_total: IntCounterVec,
    /// Failed reports by kind and reason.
    pub report_failures: IntCounterVec,
    /// Report latency histogram (milliseconds).
    pub report_latency_ms: HistogramVec,
    /// Latest averaged return per strategy run (ratio).
    pub average_return: GaugeVec,
    /// 1 once the kill switch has fired.
    pub kill_switch_triggered: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let reports_total = IntCounterVec::new(
            Opts::new("analytics_reports_total", "Total reports produced"),
            &["kind"],
        )?;

        let report_failures = IntCounterVec::new(
            Opts::new(
                "analytics_report_failures_total",
                "Total report requests that failed",
            ),
            &["kind", "reason"],
        )?;

        let report_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "analytics_report_latency_ms",
                "Report computation latency in milliseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            &["kind"],
        )?;

        let average_return = GaugeVec::new(
            Opts::new(
                "analytics_average_return",
                "Latest averaged return of a strategy run (ratio)",
            ),
            &["scope"],
        )?;

        let kill_switch_triggered = IntGauge::new(
            "analytics_kill_switch_triggered",
            "Whether the kill switch has fired (1=yes, 0=no)",
        )?;

        registry.register(Box::new(reports_total.clone()))?;
        registry.register(Box::new(report_failures.clone()))?;
        registry.register(Box::new(report_latency_ms.clone()))?;
        registry.register(Box::new(average_return.clone()))?;
        registry.register(Box::new(kill_switch_triggered.clone()))?;

        Ok(Self {
            registry,
            reports_total,
            report_failures,
            report_latency_ms,
            average_return,
            kill_switch_triggered,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl ReportMetrics for MetricsRegistry {
    fn report_completed(&self, kind: ReportKind, latency: Duration) {
        self.reports_total.with_label_values(&[kind.as_str()]).inc();
        self.report_latency_ms
            .with_label_values(&[kind.as_str()])
            .observe(latency.as_secs_f64() * 1000.0);
    }

    fn report_failed(&self, kind: ReportKind, reason: &str) {
        self.report_failures
            .with_label_values(&[kind.as_str(), reason])
            .inc();
    }

    fn average_return(&self, scope: &str, value: Option<Decimal>) {
        match value.and_then(|v| v.to_f64()) {
            Some(v) => self.average_return.with_label_values(&[scope]).set(v),
            None => {
                let _ = self.average_return.remove_label_values(&[scope]);
            }
        }
    }

    fn kill_switch_triggered(&self) {
        self.kill_switch_triggered.set(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_records_and_encodes() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.report_completed(ReportKind::Window, Duration::from_millis(12));
        metrics.report_failed(ReportKind::Window, "network_timeout");
        metrics.average_return("conf_1.yml", Some(dec!(0.05)));
        metrics.kill_switch_triggered();

        let text = metrics.encode().unwrap();
        assert!(text.contains("analytics_reports_total{kind=\"window\"} 1"));
        assert!(text.contains("reason=\"network_timeout\""));
        assert!(text.contains("analytics_average_return{scope=\"conf_1.yml\"} 0.05"));
        assert!(text.contains("analytics_kill_switch_triggered 1"));
    }

    #[test]
    fn test_absent_return_clears_gauge() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.average_return("conf_1.yml", Some(dec!(0.05)));
        metrics.average_return("conf_1.yml", None);
        assert!(!metrics.encode().unwrap().contains("conf_1.yml"));
    }
}
