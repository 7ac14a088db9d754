//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.bot.name,
    active_strategy = ?config.analytics.active_strategy,
    balance_source = ?config.analytics.balance_source,
    data_dir = %config.persistence.data_dir,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.bot.name.is_empty(), "bot.name must not be empty");

  let analytics = &config.analytics;
  anyhow::ensure!(
    analytics.commands_timeout_ms > 0,
    "commands_timeout_ms must be positive"
  );
  anyhow::ensure!(
    analytics.max_trades_display > 0,
    "max_trades_display must be positive"
  );
  anyhow::ensure!(
    analytics.request_queue > 0,
    "request_queue must be positive"
  );
  if let Some(precision) = analytics.default_precision {
    anyhow::ensure!(
      precision <= 28,
      "default_precision must be at most 28, got {precision}"
    );
  }
  if let Some(strategy) = &analytics.active_strategy {
    anyhow::ensure!(
      !strategy.trim().is_empty(),
      "active_strategy must not be blank"
    );
  }
  if let Some(rate) = analytics.kill_switch_rate {
    anyhow::ensure!(
      rate > Decimal::from(-100) && rate < Decimal::from(100),
      "kill_switch_rate must be a percentage in (-100, 100), got {rate}"
    );
    anyhow::ensure!(
      analytics.kill_switch_interval_secs > 0,
      "kill_switch_interval_secs must be positive"
    );
  }

  for (pair, rate) in &config.rates {
    anyhow::ensure!(
      pair.split_once('-').is_some_and(|(b, q)| !b.is_empty() && !q.is_empty()),
      "Rate key '{pair}' must be a BASE-QUOTE pair"
    );
    anyhow::ensure!(*rate > Decimal::ZERO, "Rate for {pair} must be positive");
  }

  for (token, amount) in &config.paper_balances {
    anyhow::ensure!(
      *amount >= Decimal::ZERO,
      "Paper balance for {token} must not be negative"
    );
  }

  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );
  if config.metrics.enabled {
    anyhow::ensure!(
      !config.metrics.bind_address.is_empty(),
      "metrics.bind_address must not be empty"
    );
  }

  Ok(())
}
