//! Kill Switch - Profitability Safety Cutoff
//!
//! Periodically asks the report service for the averaged return of the
//! active strategy run and fires once it drops to or below the configured
//! rate. A timed-out balance fetch, or any other failure, yields
//! `Unknown`: "cannot tell" is never treated as "broke even".

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::ports::report_metrics::ReportMetrics;

use super::error::ReportError;
use super::report_service::ReportHandle;

/// Outcome of one profitability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillSwitchDecision {
  Continue { average_return: Decimal },
  Trigger { average_return: Decimal },
  Unknown { reason: String },
}

/// Threshold check on the averaged return.
#[derive(Debug, Clone)]
pub struct KillSwitch {
  /// Trigger level as a ratio (-0.05 = -5%).
  rate: Decimal,
}

impl KillSwitch {
  /// `rate_pct` is a percentage, e.g. `-5` for -5%.
  pub fn from_percent(rate_pct: Decimal) -> Self {
    Self {
      rate: rate_pct / dec!(100),
    }
  }

  pub fn rate(&self) -> Decimal {
    self.rate
  }

  pub fn evaluate(&self, profitability: &Result<Option<Decimal>, ReportError>) -> KillSwitchDecision {
    match profitability {
      Ok(Some(average_return)) if *average_return <= self.rate => KillSwitchDecision::Trigger {
        average_return: *average_return,
      },
      Ok(Some(average_return)) => KillSwitchDecision::Continue {
        average_return: *average_return,
      },
      Ok(None) => KillSwitchDecision::Unknown {
        reason: "no market has a defined return".to_string(),
      },
      Err(e) if e.is_timeout() => KillSwitchDecision::Unknown {
        reason: format!("profitability unknown: {e}"),
      },
      Err(e) => KillSwitchDecision::Unknown {
        reason: e.to_string(),
      },
    }
  }
}

/// Periodic kill-switch check against the report service.
pub struct KillSwitchMonitor {
  switch: KillSwitch,
  handle: ReportHandle,
  scope: Option<String>,
  start_time: DateTime<Utc>,
  interval: Duration,
  metrics: Arc<dyn ReportMetrics>,
}

impl KillSwitchMonitor {
  pub fn new(
    switch: KillSwitch,
    handle: ReportHandle,
    scope: Option<String>,
    start_time: DateTime<Utc>,
    interval: Duration,
    metrics: Arc<dyn ReportMetrics>,
  ) -> Self {
    Self {
      switch,
      handle,
      scope,
      start_time,
      interval,
      metrics,
    }
  }

  /// Check every `interval` until the switch fires or shutdown. Returns
  /// the triggering decision, or `None` on shutdown.
  #[instrument(skip(self, shutdown_rx), fields(rate = %self.switch.rate()))]
  pub async fn run(
    self,
    mut shutdown_rx: broadcast::Receiver<()>,
  ) -> Option<KillSwitchDecision> {
    let mut ticker = tokio::time::interval(self.interval);
    info!(interval_ms = self.interval.as_millis() as u64, "Kill switch armed");

    loop {
      tokio::select! {
        _ = shutdown_rx.recv() => {
          info!("Shutdown signal received, disarming kill switch");
          return None;
        }
        _ = ticker.tick() => {
          let profitability = self
            .handle
            .current_profitability(self.scope.clone(), self.start_time)
            .await;
          let decision = self.switch.evaluate(&profitability);
          match &decision {
            KillSwitchDecision::Trigger { average_return } => {
              warn!(
                average_return = %average_return,
                "Kill switch triggered: averaged return at or below the limit"
              );
              self.metrics.kill_switch_triggered();
              return Some(decision);
            }
            KillSwitchDecision::Continue { average_return } => {
              info!(average_return = %average_return, "Kill switch check passed");
            }
            KillSwitchDecision::Unknown { reason } => {
              warn!(reason = %reason, "Kill switch check inconclusive");
            }
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_triggers_at_or_below_rate() {
    let switch = KillSwitch::from_percent(dec!(-5));
    assert_eq!(switch.rate(), dec!(-0.05));
    assert!(matches!(
      switch.evaluate(&Ok(Some(dec!(-0.05)))),
      KillSwitchDecision::Trigger { .. }
    ));
    assert!(matches!(
      switch.evaluate(&Ok(Some(dec!(-0.10)))),
      KillSwitchDecision::Trigger { .. }
    ));
    assert!(matches!(
      switch.evaluate(&Ok(Some(dec!(-0.01)))),
      KillSwitchDecision::Continue { .. }
    ));
  }

  #[test]
  fn test_timeout_is_unknown_not_zero() {
    // A zero rate would trigger on a coerced zero return.
    let switch = KillSwitch::from_percent(Decimal::ZERO);
    let timeout = Err(ReportError::NetworkTimeout {
      market: "binance".to_string(),
      timeout: Duration::from_secs(1),
    });
    assert!(matches!(
      switch.evaluate(&timeout),
      KillSwitchDecision::Unknown { .. }
    ));
    assert!(matches!(
      switch.evaluate(&Ok(None)),
      KillSwitchDecision::Unknown { .. }
    ));
    assert!(matches!(
      switch.evaluate(&Err(ReportError::NoTrades)),
      KillSwitchDecision::Unknown { .. }
    ));
  }
}
