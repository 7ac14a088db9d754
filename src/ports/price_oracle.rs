//! Price Oracle Port - Current Rate Lookup

use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait PriceOracle: Send + Sync + 'static {
  /// Current rate of `trading_pair` (`BASE-QUOTE`) in quote units, or
  /// `None` when the oracle has no price for it.
  async fn rate(&self, trading_pair: &str) -> Option<Decimal>;
}
