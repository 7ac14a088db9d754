//! Balance Source Port - Current Holdings per Market
//!
//! May be slow or unavailable. Callers bound every call with a timeout;
//! implementations do not time out on their own.

use async_trait::async_trait;

use crate::domain::trade::BalanceSnapshot;

#[async_trait]
pub trait BalanceSource: Send + Sync + 'static {
  /// Holdings per asset on `market`.
  async fn get_balances(&self, market: &str) -> anyhow::Result<BalanceSnapshot>;
}
