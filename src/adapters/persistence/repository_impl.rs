//! Repository Implementation - JSONL Store behind the Trade Record Source
//!
//! Wraps `TradeLog` (daily fill files) and `BalanceLog` (recorded
//! balances) into a single struct that implements `TradeRecordSource`.
//! Every query re-reads the files: the store keeps no cache, so reports
//! always reflect what has been appended so far.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use async_trait::async_trait;
use tracing::instrument;

use super::balances::BalanceLog;
use super::trades::TradeLog;
use crate::domain::trade::{BalanceBounds, MarketId, RecordedBalance, StrategyId, TradeFill};
use crate::ports::trade_source::TradeRecordSource;

/// File-backed trade store.
pub struct RepositoryImpl {
    trade_log: TradeLog,
    balance_log: BalanceLog,
}

impl RepositoryImpl {
    pub fn new(trade_log: TradeLog, balance_log: BalanceLog) -> Self {
        Self {
            trade_log,
            balance_log,
        }
    }

    /// Open both logs under `data_dir`, creating subdirectories as needed.
    pub async fn from_data_dir(data_dir: &str) -> Result<Self> {
        let trade_log = TradeLog::new(data_dir).await?;
        let balance_log = BalanceLog::new(data_dir).await?;
        Ok(Self::new(trade_log, balance_log))
    }

    /// Append a fill. Used by strategy writers and tests.
    pub async fn record_fill(&self, fill: &TradeFill) -> Result<()> {
        self.trade_log.append_fill(fill).await
    }

    /// Append a balance-log entry.
    pub async fn record_balance(&self, entry: &RecordedBalance) -> Result<()> {
        self.balance_log.append_balance(entry).await
    }

    /// Latest recorded balance of a strategy run.
    pub async fn latest_balance(&self, strategy_id: &str) -> Result<Option<RecordedBalance>> {
        self.balance_log.latest(strategy_id).await
    }

    pub async fn is_healthy(&self) -> bool {
        self.trade_log.is_healthy().await && self.balance_log.is_healthy().await
    }
}

#[async_trait]
impl TradeRecordSource for RepositoryImpl {
    #[instrument(skip(self))]
    async fn trades_since(
        &self,
        from_ms: i64,
        strategy_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<TradeFill>> {
        let mut fills: Vec<TradeFill> = self
            .trade_log
            .load_all_fills()
            .await?
            .into_iter()
            .filter(|f| f.timestamp_ms >= from_ms)
            .filter(|f| strategy_id.is_none_or(|id| f.strategy_id == id))
            .collect();

        if let Some(limit) = limit {
            fills.reverse();
            fills.truncate(limit);
        }
        Ok(fills)
    }

    async fn all_trades(&self) -> Result<Vec<TradeFill>> {
        self.trade_log.load_all_fills().await
    }

    async fn distinct_strategies(&self) -> Result<Vec<StrategyId>> {
        let fills = self.trade_log.load_all_fills().await?;
        let ids: BTreeSet<StrategyId> = fills
            .into_iter()
            .map(|f| f.strategy_id)
            .filter(|id| !id.trim().is_empty())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn distinct_markets(&self) -> Result<Vec<MarketId>> {
        let fills = self.trade_log.load_all_fills().await?;
        let markets: BTreeSet<MarketId> = fills
            .into_iter()
            .map(|f| f.market)
            .filter(|m| !m.trim().is_empty())
            .collect();
        Ok(markets.into_iter().collect())
    }

    async fn strategies_by_market(&self) -> Result<BTreeMap<MarketId, Vec<StrategyId>>> {
        let fills = self.trade_log.load_all_fills().await?;
        let mut grouped: BTreeMap<MarketId, BTreeSet<StrategyId>> = BTreeMap::new();
        for fill in fills.into_iter().filter(TradeFill::is_resolvable) {
            grouped.entry(fill.market).or_default().insert(fill.strategy_id);
        }
        Ok(grouped
            .into_iter()
            .map(|(market, ids)| (market, ids.into_iter().collect()))
            .collect())
    }

    async fn balance_bounds(&self, strategy_id: &str) -> Result<Option<BalanceBounds>> {
        self.balance_log.bounds(strategy_id).await
    }
}
