//! Window Report - Scope Aggregator
//!
//! Loads the fills of one strategy run since a start time, groups them by
//! (market, trading pair) and runs the metric calculator on each group
//! against that market's current balances.
//!
//! Groups are resolved one at a time in sorted order. Each balance fetch
//! is bounded by `balance_timeout`; a single timeout aborts the whole
//! report and no partial result is returned.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::domain::fees::FeeLedger;
use crate::domain::metrics::{MetricCalculator, PerformanceMetrics, PricingContext};
use crate::domain::report::{Report, ReportWindow};
use crate::domain::trade::{MarketId, TradeFill, TradingPair};
use crate::ports::balance_source::BalanceSource;
use crate::ports::price_oracle::PriceOracle;
use crate::ports::trade_source::TradeRecordSource;

use super::error::ReportError;

/// Newest fills of a scope, capped for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTrades {
  /// Newest first.
  pub trades: Vec<TradeFill>,
  /// More fills exist than were returned.
  pub truncated: bool,
}

/// Scope aggregator for the window report.
pub struct WindowReporter<T: TradeRecordSource, B: BalanceSource, O: PriceOracle> {
  trades: Arc<T>,
  balances: Arc<B>,
  oracle: Arc<O>,
  calculator: MetricCalculator,
  balance_timeout: Duration,
}

impl<T: TradeRecordSource, B: BalanceSource, O: PriceOracle> WindowReporter<T, B, O> {
  pub fn new(
    trades: Arc<T>,
    balances: Arc<B>,
    oracle: Arc<O>,
    calculator: MetricCalculator,
    balance_timeout: Duration,
  ) -> Self {
    Self {
      trades,
      balances,
      oracle,
      calculator,
      balance_timeout,
    }
  }

  /// Performance of `scope` since `start_time`, per (market, pair).
  ///
  /// # Errors
  /// `NoActiveStrategy` without a scope, `NoTrades` when the window is
  /// empty, `NetworkTimeout` when any balance fetch exceeds the bound.
  #[instrument(skip(self), fields(start = %start_time))]
  pub async fn window_report(
    &self,
    scope: Option<&str>,
    start_time: DateTime<Utc>,
  ) -> Result<Report, ReportError> {
    let scope = scope.ok_or(ReportError::NoActiveStrategy)?;
    let fills = self
      .trades
      .trades_since(start_time.timestamp_millis(), Some(scope), None)
      .await
      .map_err(ReportError::Source)?;

    let groups = group_by_market(fills);
    if groups.is_empty() {
      return Err(ReportError::NoTrades);
    }

    let mut markets = Vec::with_capacity(groups.len());
    for ((market, symbol), fills) in &groups {
      let perf = self
        .resolve_group(market, symbol, fills, start_time)
        .await?;
      markets.push(perf);
    }

    let report = Report::new(ReportWindow::new(start_time, Utc::now()), markets);
    info!(
      scope,
      groups = report.markets.len(),
      average_return = ?report.average_return,
      "Window report computed"
    );
    Ok(report)
  }

  /// Averaged return of `scope` since `start_time`, for the kill switch.
  ///
  /// `Ok(None)` means no group has a defined return. Errors pass through
  /// unchanged so a timeout is never read as zero.
  pub async fn current_profitability(
    &self,
    scope: Option<&str>,
    start_time: DateTime<Utc>,
  ) -> Result<Option<Decimal>, ReportError> {
    Ok(self.window_report(scope, start_time).await?.average_return)
  }

  /// The newest `max_rows` fills of `scope` since `start_time`.
  #[instrument(skip(self))]
  pub async fn recent_trades(
    &self,
    scope: Option<&str>,
    start_time: DateTime<Utc>,
    max_rows: usize,
  ) -> Result<RecentTrades, ReportError> {
    let scope = scope.ok_or(ReportError::NoActiveStrategy)?;
    let mut trades = self
      .trades
      .trades_since(
        start_time.timestamp_millis(),
        Some(scope),
        Some(max_rows.saturating_add(1)),
      )
      .await
      .map_err(ReportError::Source)?;

    let truncated = trades.len() > max_rows;
    trades.truncate(max_rows);
    Ok(RecentTrades { trades, truncated })
  }

  async fn resolve_group(
    &self,
    market: &str,
    symbol: &str,
    fills: &[TradeFill],
    start_time: DateTime<Utc>,
  ) -> Result<PerformanceMetrics, ReportError> {
    let balances = match tokio::time::timeout(
      self.balance_timeout,
      self.balances.get_balances(market),
    )
    .await
    {
      Ok(Ok(balances)) => balances,
      Ok(Err(source)) => {
        return Err(ReportError::BalanceUnavailable {
          market: market.to_string(),
          source,
        });
      }
      Err(_) => {
        warn!(
          market,
          timeout_ms = self.balance_timeout.as_millis() as u64,
          "A network error prevented the balances retrieval to complete"
        );
        return Err(ReportError::NetworkTimeout {
          market: market.to_string(),
          timeout: self.balance_timeout,
        });
      }
    };

    let pricing = self.pricing_for(symbol, fills).await?;
    debug!(market, symbol, fills = fills.len(), "Resolving group");
    Ok(self.calculator.calculate(
      market,
      symbol,
      fills,
      &balances,
      start_time.timestamp_millis(),
      &pricing,
    )?)
  }

  /// Current pair price plus rates for fee tokens outside the pair.
  async fn pricing_for(
    &self,
    symbol: &str,
    fills: &[TradeFill],
  ) -> Result<PricingContext, ReportError> {
    let pair = TradingPair::parse(symbol)?;
    let ledger = FeeLedger::from_fills(fills, &pair);

    let mut fee_rates = HashMap::new();
    for token in ledger.foreign_tokens(&pair) {
      if let Some(rate) = self.oracle.rate(&pair.rate_symbol_for(token)).await {
        fee_rates.insert(token.clone(), rate);
      }
    }

    Ok(PricingContext {
      current_price: self.oracle.rate(symbol).await,
      fee_rates,
    })
  }
}

/// Group fills by (market, trading pair). Fills without a market are
/// dropped.
fn group_by_market(fills: Vec<TradeFill>) -> BTreeMap<(MarketId, String), Vec<TradeFill>> {
  let mut groups: BTreeMap<(MarketId, String), Vec<TradeFill>> = BTreeMap::new();
  for fill in fills {
    if !fill.is_resolvable() {
      warn!(symbol = %fill.symbol, "Skipping fill without a market");
      continue;
    }
    groups
      .entry((fill.market.clone(), fill.symbol.clone()))
      .or_default()
      .push(fill);
  }
  groups
}
