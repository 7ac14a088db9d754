//! Price Oracle Adapters
//!
//! - `StaticRateOracle`: fixed rates from the `[rates]` config table
//! - `LastFillPriceOracle`: latest recorded fill price of the pair
//! - `FallbackOracle`: first oracle that knows the pair wins

pub mod last_fill;
pub mod static_rates;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::ports::price_oracle::PriceOracle;

pub use last_fill::LastFillPriceOracle;
pub use static_rates::StaticRateOracle;

/// Chains two oracles, consulting `secondary` only when `primary` has no
/// rate for the pair.
pub struct FallbackOracle<P, S> {
    primary: P,
    secondary: S,
}

impl<P: PriceOracle, S: PriceOracle> FallbackOracle<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P: PriceOracle, S: PriceOracle> PriceOracle for FallbackOracle<P, S> {
    async fn rate(&self, trading_pair: &str) -> Option<Decimal> {
        match self.primary.rate(trading_pair).await {
            Some(rate) => Some(rate),
            None => self.secondary.rate(trading_pair).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::adapters::persistence::RepositoryImpl;
    use crate::domain::trade::{TradeFee, TradeFill, TradeSide};
    use rust_decimal_macros::dec;

    fn fill(price: Decimal, ts: i64) -> TradeFill {
        TradeFill {
            market: "kucoin".to_string(),
            symbol: "ETH-USDT".to_string(),
            strategy_id: "conf_1.yml".to_string(),
            side: TradeSide::Sell,
            price,
            amount: dec!(1),
            fee: TradeFee::none(),
            timestamp_ms: ts,
            order_id: None,
            exchange_trade_id: None,
        }
    }

    #[tokio::test]
    async fn test_static_rate_wins_then_last_fill() {
        let dir = std::env::temp_dir().join(format!("analytics-oracle-{}", uuid::Uuid::new_v4()));
        let store = Arc::new(
            RepositoryImpl::from_data_dir(dir.to_str().unwrap())
                .await
                .unwrap(),
        );
        store.record_fill(&fill(dec!(1900), 1)).await.unwrap();
        store.record_fill(&fill(dec!(2100), 2)).await.unwrap();

        let oracle = FallbackOracle::new(
            StaticRateOracle::new(HashMap::from([("BNB-USDT".to_string(), dec!(300))])),
            LastFillPriceOracle::new(store),
        );
        assert_eq!(oracle.rate("BNB-USDT").await, Some(dec!(300)));
        assert_eq!(oracle.rate("ETH-USDT").await, Some(dec!(2100)));
        assert_eq!(oracle.rate("SOL-USDT").await, None);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
