//! Paper-trading balances: the same configured holdings on every market.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::trade::{BalanceSnapshot, Token};
use crate::ports::balance_source::BalanceSource;

pub struct PaperBalanceSource {
    balances: BalanceSnapshot,
}

impl PaperBalanceSource {
    pub fn new(balances: &BTreeMap<Token, Decimal>) -> Self {
        Self {
            balances: balances
                .iter()
                .map(|(token, amount)| (token.clone(), *amount))
                .collect(),
        }
    }
}

#[async_trait]
impl BalanceSource for PaperBalanceSource {
    async fn get_balances(&self, _market: &str) -> anyhow::Result<BalanceSnapshot> {
        Ok(self.balances.clone())
    }
}
