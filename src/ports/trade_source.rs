//! Trade Record Source Port - Read Side of the Trade Log
//!
//! The analytics engine never writes: it reads executed fills and the
//! recorded balance log through this trait. Implementations must be
//! cheap to call repeatedly; every report re-queries from scratch.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::trade::{BalanceBounds, MarketId, StrategyId, TradeFill};

/// Query interface over the persisted trade log.
#[async_trait]
pub trait TradeRecordSource: Send + Sync + 'static {
  /// Fills with `timestamp >= from_ms`, optionally restricted to one
  /// strategy run.
  ///
  /// Ascending by timestamp. When `limit` is set, the newest `limit`
  /// fills are returned in descending order instead.
  async fn trades_since(
    &self,
    from_ms: i64,
    strategy_id: Option<&str>,
    limit: Option<usize>,
  ) -> anyhow::Result<Vec<TradeFill>>;

  /// Every recorded fill, ascending by timestamp.
  async fn all_trades(&self) -> anyhow::Result<Vec<TradeFill>>;

  /// Distinct non-empty strategy-run identifiers in the log.
  async fn distinct_strategies(&self) -> anyhow::Result<Vec<StrategyId>>;

  /// Distinct non-empty market identifiers in the log.
  async fn distinct_markets(&self) -> anyhow::Result<Vec<MarketId>>;

  /// Strategy runs that traded on each market.
  async fn strategies_by_market(
    &self,
  ) -> anyhow::Result<BTreeMap<MarketId, Vec<StrategyId>>>;

  /// Earliest and latest recorded balances of a strategy run, if the
  /// balance log has any entry for it.
  async fn balance_bounds(
    &self,
    strategy_id: &str,
  ) -> anyhow::Result<Option<BalanceBounds>>;
}
