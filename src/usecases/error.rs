use std::time::Duration;

use thiserror::Error;

use crate::domain::error::AnalyticsError;

/// Failures of the window-report entry points.
///
/// `NoTrades` and `NetworkTimeout` are distinct variants so a caller can
/// tell "nothing happened" and "cannot tell" apart from a zero return.
#[derive(Error, Debug)]
pub enum ReportError {
  #[error("No strategy is active; import a strategy config to report on")]
  NoActiveStrategy,

  #[error("No past trades to report")]
  NoTrades,

  #[error("Balance retrieval for {market} timed out after {timeout:?}")]
  NetworkTimeout { market: String, timeout: Duration },

  #[error("Balances for {market} are unavailable")]
  BalanceUnavailable {
    market: String,
    #[source]
    source: anyhow::Error,
  },

  #[error("Trade record source failed")]
  Source(#[source] anyhow::Error),

  #[error(transparent)]
  Analytics(#[from] AnalyticsError),

  #[error("Report service has stopped")]
  ServiceStopped,
}

impl ReportError {
  /// Short stable label for metrics.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::NoActiveStrategy => "no_active_strategy",
      Self::NoTrades => "no_trades",
      Self::NetworkTimeout { .. } => "network_timeout",
      Self::BalanceUnavailable { .. } => "balance_unavailable",
      Self::Source(_) => "source",
      Self::Analytics(_) => "analytics",
      Self::ServiceStopped => "service_stopped",
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::NetworkTimeout { .. })
  }
}
