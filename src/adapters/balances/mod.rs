//! Balance Source Adapters
//!
//! - `PaperBalanceSource`: fixed paper-trading balances from configuration
//! - `RecordedBalanceSource`: latest entry of the recorded balance log,
//!   for runs without a live exchange connection
//! - `ConfiguredBalanceSource`: whichever of the two `config.toml` selects

pub mod paper;
pub mod recorded;

use async_trait::async_trait;

use crate::domain::trade::BalanceSnapshot;
use crate::ports::balance_source::BalanceSource;

pub use paper::PaperBalanceSource;
pub use recorded::RecordedBalanceSource;

/// Balance source chosen at startup by `analytics.balance_source`.
pub enum ConfiguredBalanceSource {
    Paper(PaperBalanceSource),
    Recorded(RecordedBalanceSource),
}

#[async_trait]
impl BalanceSource for ConfiguredBalanceSource {
    async fn get_balances(&self, market: &str) -> anyhow::Result<BalanceSnapshot> {
        match self {
            Self::Paper(source) => source.get_balances(market).await,
            Self::Recorded(source) => source.get_balances(market).await,
        }
    }
}
