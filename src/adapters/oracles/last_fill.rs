//! Latest recorded fill price as the current rate.
//!
//! Used when no live price feed exists: the last price the pair traded
//! at, on any market and under any strategy run.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use crate::ports::price_oracle::PriceOracle;
use crate::ports::trade_source::TradeRecordSource;

pub struct LastFillPriceOracle<T: TradeRecordSource> {
    trades: Arc<T>,
}

impl<T: TradeRecordSource> LastFillPriceOracle<T> {
    pub fn new(trades: Arc<T>) -> Self {
        Self { trades }
    }
}

#[async_trait]
impl<T: TradeRecordSource> PriceOracle for LastFillPriceOracle<T> {
    async fn rate(&self, trading_pair: &str) -> Option<Decimal> {
        match self.trades.all_trades().await {
            Ok(fills) => fills
                .iter()
                .filter(|f| f.symbol == trading_pair)
                .max_by_key(|f| f.timestamp_ms)
                .map(|f| f.price),
            Err(e) => {
                warn!(trading_pair, error = %e, "Trade lookup for last fill price failed");
                None
            }
        }
    }
}
