//! Fixed conversion rates from configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::ports::price_oracle::PriceOracle;

#[derive(Debug, Clone, Default)]
pub struct StaticRateOracle {
    rates: HashMap<String, Decimal>,
}

impl StaticRateOracle {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl PriceOracle for StaticRateOracle {
    async fn rate(&self, trading_pair: &str) -> Option<Decimal> {
        if let Some(rate) = self.rates.get(trading_pair) {
            return Some(*rate);
        }
        // A configured inverse pair (QUOTE-BASE) also answers.
        let (base, quote) = trading_pair.split_once('-')?;
        self.rates
            .get(&format!("{quote}-{base}"))
            .filter(|r| !r.is_zero())
            .map(|r| Decimal::ONE / *r)
    }
}
