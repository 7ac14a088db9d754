//! Report values produced by the two entry points.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use super::format::{format_duration, format_pct_or_na};
use super::metrics::PerformanceMetrics;
use super::portfolio::PortfolioRow;
use super::safe_math::mean;
use super::trade::{MarketId, StrategyId};

/// Message returned when the trade log holds nothing to aggregate.
pub const NO_HISTORICAL_DATA: &str = "No strategy config files found in trade history or no unique exchanges or no grouped config files.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time window a report covers. Serializes as formatted `start_time`,
/// `current_time` and `duration` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start_time: DateTime<Utc>, current_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            current_time,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.current_time - self.start_time
    }
}

impl Serialize for ReportWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ReportWindow", 3)?;
        s.serialize_field("start_time", &self.start_time.format(TIME_FORMAT).to_string())?;
        s.serialize_field(
            "current_time",
            &self.current_time.format(TIME_FORMAT).to_string(),
        )?;
        s.serialize_field("duration", &format_duration(self.duration()))?;
        s.end()
    }
}

/// Window report: one entry per (market, trading pair) scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub window: ReportWindow,
    /// Sorted by (market, trading pair).
    pub markets: Vec<PerformanceMetrics>,
    /// Mean of the defined per-scope returns.
    #[serde(serialize_with = "serialize_average_return")]
    pub average_return: Option<Decimal>,
}

fn serialize_average_return<S: Serializer>(
    value: &Option<Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_pct_or_na(*value))
}

impl Report {
    pub fn new(window: ReportWindow, mut markets: Vec<PerformanceMetrics>) -> Self {
        markets.sort_by(|a, b| {
            (a.market.as_str(), a.trading_pair.as_str())
                .cmp(&(b.market.as_str(), b.trading_pair.as_str()))
        });
        let average_return = mean(markets.iter().filter_map(|m| m.return_pct));
        Self {
            window,
            markets,
            average_return,
        }
    }

    /// The average return is only worth displaying across several scopes.
    pub fn shows_average_return(&self) -> bool {
        self.markets.len() > 1
    }
}

/// Cross-portfolio report over every recorded strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedReport {
    #[serde(flatten)]
    pub window: ReportWindow,
    /// One row per strategy run, sorted by strategy id.
    pub markets: Vec<PortfolioRow>,
    pub unique_strategies: Vec<StrategyId>,
    pub unique_markets: Vec<MarketId>,
    pub strategies_by_market: BTreeMap<MarketId, Vec<StrategyId>>,
}

/// Failure of the full report, returned as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ReportFailure {
    pub fn no_historical_data() -> Self {
        Self {
            error: NO_HISTORICAL_DATA.to_string(),
            trace: None,
        }
    }

    pub fn internal(error: &anyhow::Error) -> Self {
        Self {
            error: error.to_string(),
            trace: Some(format!("{error:?}")),
        }
    }
}

/// Outcome of the full report. Consumers check for an `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FullReport {
    Ok(AggregatedReport),
    Failed(ReportFailure),
}

impl FullReport {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_serializes_formatted_times() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 1, 2, 3).unwrap();
        let json = serde_json::to_value(ReportWindow::new(start, now)).unwrap();
        assert_eq!(json["start_time"], "2024-01-01 00:00:00");
        assert_eq!(json["duration"], "2 days 01:02:03");
    }

    #[test]
    fn test_empty_report_has_no_average_return() {
        let now = Utc::now();
        let report = Report::new(ReportWindow::new(now, now), Vec::new());
        assert_eq!(report.average_return, None);
        assert!(!report.shows_average_return());
    }

    #[test]
    fn test_failure_serializes_error_key() {
        let json = serde_json::to_value(FullReport::Failed(ReportFailure::no_historical_data()))
            .unwrap();
        assert_eq!(json["error"], NO_HISTORICAL_DATA);
        assert!(json.get("markets").is_none());
        assert!(json.get("trace").is_none());

        let err = anyhow::anyhow!("disk gone").context("loading trades");
        let json = serde_json::to_value(FullReport::Failed(ReportFailure::internal(&err))).unwrap();
        assert_eq!(json["error"], "loading trades");
        assert!(json["trace"].as_str().unwrap().contains("disk gone"));
    }
}
