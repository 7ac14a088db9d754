//! Metrics Adapter
//!
//! Prometheus registry implementing the `ReportMetrics` port. The text
//! exposition is served by the HTTP adapter on `/metrics`.

pub mod prometheus;

pub use self::prometheus::MetricsRegistry;
