//! Configuration Module - TOML-based Analytics Configuration
//!
//! Loads and validates configuration from `config.toml`. Balance and
//! rate tables used by the offline adapters are externalized here;
//! nothing is hardcoded in the domain layer.

pub mod loader;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::trade::{DerivativeMarkets, Token};

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any report runs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Process identity and logging.
  pub bot: BotConfig,
  /// Report behavior.
  #[serde(default)]
  pub analytics: AnalyticsConfig,
  /// Paper-trading balances, token → amount.
  #[serde(default)]
  pub paper_balances: BTreeMap<Token, Decimal>,
  /// Static conversion rates, `BASE-QUOTE` → rate.
  #[serde(default)]
  pub rates: HashMap<String, Decimal>,
  /// Trade log location.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Metrics and HTTP server.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Where current balances come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSourceKind {
  /// `[paper_balances]` table.
  #[default]
  Paper,
  /// Latest entry of the recorded balance log.
  Recorded,
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
  /// Strategy run reported on by the window report.
  #[serde(default)]
  pub active_strategy: Option<String>,
  /// Bound on each balance fetch (milliseconds).
  #[serde(default = "default_commands_timeout_ms")]
  pub commands_timeout_ms: u64,
  /// Display precision; smart rounding when absent.
  #[serde(default)]
  pub default_precision: Option<u32>,
  /// Maximum rows in a recent-trades listing.
  #[serde(default = "default_max_trades_display")]
  pub max_trades_display: usize,
  /// Markets without a spot base holding.
  #[serde(default)]
  pub derivative_markets: Vec<String>,
  /// Name suffix marking derivative markets.
  #[serde(default = "default_derivative_suffix")]
  pub derivative_suffix: String,
  #[serde(default)]
  pub balance_source: BalanceSourceKind,
  /// Kill switch threshold in percent (e.g. -5.0). Disabled when absent.
  #[serde(default)]
  pub kill_switch_rate: Option<Decimal>,
  /// Kill switch check interval (seconds).
  #[serde(default = "default_kill_switch_interval_secs")]
  pub kill_switch_interval_secs: u64,
  /// Report service channel capacity.
  #[serde(default = "default_request_queue")]
  pub request_queue: usize,
}

impl Default for AnalyticsConfig {
  fn default() -> Self {
    Self {
      active_strategy: None,
      commands_timeout_ms: default_commands_timeout_ms(),
      default_precision: None,
      max_trades_display: default_max_trades_display(),
      derivative_markets: Vec::new(),
      derivative_suffix: default_derivative_suffix(),
      balance_source: BalanceSourceKind::default(),
      kill_switch_rate: None,
      kill_switch_interval_secs: default_kill_switch_interval_secs(),
      request_queue: default_request_queue(),
    }
  }
}

impl AnalyticsConfig {
  pub fn commands_timeout(&self) -> Duration {
    Duration::from_millis(self.commands_timeout_ms)
  }

  pub fn kill_switch_interval(&self) -> Duration {
    Duration::from_secs(self.kill_switch_interval_secs)
  }

  pub fn derivatives(&self) -> DerivativeMarkets {
    DerivativeMarkets::new(
      self.derivative_markets.iter().cloned(),
      Some(self.derivative_suffix.clone()),
    )
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory holding `trades/` and `balances/`.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// Metrics and HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Register Prometheus metrics and serve `/metrics`.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// HTTP bind address for `serve`.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_bind_address(),
    }
  }
}

/// Start of a report window `days` back from now; `days <= 0` (or NaN)
/// means the session start. Spans reaching past the representable range
/// clamp to the Unix epoch.
pub fn window_start(days: f64, session_start: DateTime<Utc>) -> DateTime<Utc> {
  if days > 0.0 {
    // float to int casts saturate
    chrono::Duration::try_milliseconds((days * 86_400_000.0) as i64)
      .and_then(|span| Utc::now().checked_sub_signed(span))
      .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
  } else {
    session_start
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_commands_timeout_ms() -> u64 {
  30_000
}

fn default_max_trades_display() -> usize {
  500
}

fn default_derivative_suffix() -> String {
  "_perpetual".to_string()
}

fn default_kill_switch_interval_secs() -> u64 {
  10
}

fn default_request_queue() -> usize {
  64
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_true() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_window_start_uses_session_start_without_days() {
    let session = Utc::now() - chrono::Duration::hours(3);
    assert_eq!(window_start(0.0, session), session);
    assert_eq!(window_start(-2.0, session), session);
    assert_eq!(window_start(f64::NAN, session), session);
  }

  #[test]
  fn test_window_start_goes_back_from_now() {
    let start = window_start(1.0, DateTime::<Utc>::UNIX_EPOCH);
    let span = Utc::now() - start;
    assert!(span >= chrono::Duration::hours(24));
    assert!(span < chrono::Duration::hours(25));
  }

  #[test]
  fn test_window_start_clamps_huge_spans() {
    let session = Utc::now();
    assert_eq!(window_start(1.0e8, session), DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(window_start(f64::INFINITY, session), DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(window_start(f64::MAX, session), DateTime::<Utc>::UNIX_EPOCH);
  }
}
