//! Full Report - Cross-Portfolio Aggregator
//!
//! One row per strategy run over the entire trade history, with balances
//! drawn from the recorded balance log instead of a live connection.
//! Failures never propagate: the entry point converts them into a
//! `FullReport::Failed` value carrying the message and error chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use crate::domain::portfolio::PortfolioRow;
use crate::domain::report::{AggregatedReport, FullReport, ReportFailure, ReportWindow};
use crate::domain::trade::{StrategyId, TradeFill};
use crate::ports::trade_source::TradeRecordSource;

/// Cross-portfolio aggregator.
pub struct FullReporter<T: TradeRecordSource> {
  trades: Arc<T>,
}

impl<T: TradeRecordSource> FullReporter<T> {
  pub fn new(trades: Arc<T>) -> Self {
    Self { trades }
  }

  /// Build the aggregated report. `start_time` only labels the header;
  /// rows always cover the full history.
  #[instrument(skip(self))]
  pub async fn full_report(&self, start_time: DateTime<Utc>) -> FullReport {
    match self.try_full_report(start_time).await {
      Ok(report) => report,
      Err(e) => {
        error!(error = %e, "Full report failed");
        FullReport::Failed(ReportFailure::internal(&e))
      }
    }
  }

  async fn try_full_report(&self, start_time: DateTime<Utc>) -> anyhow::Result<FullReport> {
    let unique_strategies = self
      .trades
      .distinct_strategies()
      .await
      .context("Failed to list strategy runs")?;
    let unique_markets = self
      .trades
      .distinct_markets()
      .await
      .context("Failed to list markets")?;
    let strategies_by_market = self
      .trades
      .strategies_by_market()
      .await
      .context("Failed to group strategy runs by market")?;

    if unique_strategies.is_empty() || unique_markets.is_empty() || strategies_by_market.is_empty()
    {
      warn!("No historical data for the full report");
      return Ok(FullReport::Failed(ReportFailure::no_historical_data()));
    }

    let fills = self
      .trades
      .all_trades()
      .await
      .context("Failed to load trade history")?;

    let mut rows = Vec::new();
    for (strategy_id, fills) in group_by_strategy(fills) {
      let bounds = self
        .trades
        .balance_bounds(&strategy_id)
        .await
        .with_context(|| format!("Failed to load balance log of {strategy_id}"))?;
      match PortfolioRow::compute(&strategy_id, &fills, bounds.as_ref()) {
        Ok(row) => rows.push(row),
        Err(e) => warn!(strategy_id = %strategy_id, error = %e, "Skipping strategy run"),
      }
    }

    info!(rows = rows.len(), "Full report computed");
    Ok(FullReport::Ok(AggregatedReport {
      window: ReportWindow::new(start_time, Utc::now()),
      markets: rows,
      unique_strategies,
      unique_markets,
      strategies_by_market,
    }))
  }
}

/// Resolvable fills grouped by strategy run, in id order.
fn group_by_strategy(fills: Vec<TradeFill>) -> BTreeMap<StrategyId, Vec<TradeFill>> {
  let mut groups: BTreeMap<StrategyId, Vec<TradeFill>> = BTreeMap::new();
  for fill in fills.into_iter().filter(TradeFill::is_resolvable) {
    groups.entry(fill.strategy_id.clone()).or_default().push(fill);
  }
  groups
}
