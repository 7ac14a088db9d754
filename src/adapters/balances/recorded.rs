//! Balances reconstructed from the recorded balance log.
//!
//! The log stores base/quote totals per strategy run, not per asset, so
//! the run's latest fill on the market supplies the trading pair that
//! names the two assets.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::adapters::persistence::RepositoryImpl;
use crate::domain::trade::{BalanceSnapshot, TradingPair};
use crate::ports::balance_source::BalanceSource;
use crate::ports::trade_source::TradeRecordSource;

pub struct RecordedBalanceSource {
    store: Arc<RepositoryImpl>,
    strategy_id: String,
}

impl RecordedBalanceSource {
    pub fn new(store: Arc<RepositoryImpl>, strategy_id: impl Into<String>) -> Self {
        Self {
            store,
            strategy_id: strategy_id.into(),
        }
    }
}

#[async_trait]
impl BalanceSource for RecordedBalanceSource {
    #[instrument(skip(self), fields(strategy_id = %self.strategy_id))]
    async fn get_balances(&self, market: &str) -> anyhow::Result<BalanceSnapshot> {
        let newest = self
            .store
            .trades_since(0, Some(&self.strategy_id), None)
            .await?
            .into_iter()
            .filter(|f| f.market == market)
            .max_by_key(|f| f.timestamp_ms);
        let Some(fill) = newest else {
            warn!(market, "No recorded fill to derive the trading pair from");
            return Ok(BalanceSnapshot::new());
        };
        let pair = TradingPair::parse(&fill.symbol)
            .with_context(|| format!("Recorded fill on {market} has an invalid symbol"))?;

        match self.store.latest_balance(&self.strategy_id).await? {
            Some(entry) => Ok(entry.to_snapshot(&pair)),
            None => {
                warn!(market, symbol = %pair, "No balance record found");
                Ok(BalanceSnapshot::new())
            }
        }
    }
}
