//! Fee aggregation over recorded fills.
//!
//! Two views of the same fee data:
//! - `FeeLedger`: fees accumulated per fee token, then converted to the
//!   quote currency with the rates known at report time (window report).
//! - `fill_fee_in_quote`: a single fill's fees converted at that fill's
//!   own price (cross-portfolio report, independent of live rates).

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use super::trade::{Token, TradeFill, TradingPair};

/// Fees paid, grouped by the token they were charged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeeLedger {
    by_token: BTreeMap<Token, Decimal>,
}

/// Result of converting a `FeeLedger` into quote currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteFees {
    /// Sum of all fees that could be priced, in quote units.
    pub total: Decimal,
    /// Fee tokens with no known rate; excluded from `total`.
    pub unpriced: Vec<Token>,
}

impl FeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate the fees of every fill.
    ///
    /// Percentage fees are charged on the notional and booked to
    /// `percent_token`, or to the quote token when none is recorded.
    /// Negative percentages are maker rebates and reduce the total.
    pub fn from_fills<'a, I>(fills: I, pair: &TradingPair) -> Self
    where
        I: IntoIterator<Item = &'a TradeFill>,
    {
        let mut ledger = Self::new();
        for fill in fills {
            if let Some(percent) = fill.fee.percent.filter(|p| !p.is_zero()) {
                let token = fill
                    .fee
                    .percent_token
                    .clone()
                    .unwrap_or_else(|| pair.quote.clone());
                ledger.add(token, fill.notional() * percent);
            }
            for flat in &fill.fee.flat_fees {
                ledger.add(flat.token.clone(), flat.amount);
            }
        }
        ledger
    }

    pub fn add(&mut self, token: Token, amount: Decimal) {
        *self.by_token.entry(token).or_insert(Decimal::ZERO) += amount;
    }

    pub fn get(&self, token: &str) -> Option<Decimal> {
        self.by_token.get(token).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Decimal)> {
        self.by_token.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// Tokens other than the pair's own, which need an external rate.
    pub fn foreign_tokens<'a>(&'a self, pair: &'a TradingPair) -> impl Iterator<Item = &'a Token> {
        self.by_token
            .keys()
            .filter(move |t| **t != pair.base && **t != pair.quote)
    }

    /// Convert every fee to quote currency.
    ///
    /// Quote fees pass through, base fees convert at `current_price`, and
    /// any other token uses `rates` (keyed by token). Tokens without a rate
    /// are reported in `unpriced`.
    pub fn in_quote(
        &self,
        pair: &TradingPair,
        current_price: Decimal,
        rates: &HashMap<Token, Decimal>,
    ) -> QuoteFees {
        let mut total = Decimal::ZERO;
        let mut unpriced = Vec::new();
        for (token, amount) in &self.by_token {
            if *token == pair.quote {
                total += *amount;
            } else if *token == pair.base {
                total += *amount * current_price;
            } else if let Some(rate) = rates.get(token) {
                total += *amount * *rate;
            } else {
                unpriced.push(token.clone());
            }
        }
        QuoteFees { total, unpriced }
    }
}

/// A single fill's fees in quote currency, converted at the fill price.
///
/// Percentage fees contribute `price × amount × percent`; flat fees in the
/// quote token pass through and any other flat fee is treated as base
/// denominated and converted at the fill price.
pub fn fill_fee_in_quote(fill: &TradeFill, quote: &str) -> Decimal {
    let percent_fee = fill
        .fee
        .percent
        .map_or(Decimal::ZERO, |percent| fill.notional() * percent);
    let flat_fee: Decimal = fill
        .fee
        .flat_fees
        .iter()
        .map(|flat| {
            if flat.token == quote {
                flat.amount
            } else {
                flat.amount * fill.price
            }
        })
        .sum();
    percent_fee + flat_fee
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{FlatFee, TradeFee, TradeSide};
    use rust_decimal_macros::dec;

    fn fill(price: Decimal, amount: Decimal, fee: TradeFee) -> TradeFill {
        TradeFill {
            market: "binance".to_string(),
            symbol: "BTC-USDT".to_string(),
            strategy_id: "conf_1.yml".to_string(),
            side: TradeSide::Buy,
            price,
            amount,
            fee,
            timestamp_ms: 1,
            order_id: None,
            exchange_trade_id: None,
        }
    }

    fn pair() -> TradingPair {
        TradingPair::parse("BTC-USDT").unwrap()
    }

    #[test]
    fn test_percent_fee_booked_to_quote_by_default() {
        let fills = [fill(dec!(100), dec!(2), TradeFee::percent(dec!(0.001)))];
        let ledger = FeeLedger::from_fills(&fills, &pair());
        assert_eq!(ledger.get("USDT"), Some(dec!(0.2)));
    }

    #[test]
    fn test_percent_fee_with_explicit_token() {
        let fee = TradeFee {
            percent: Some(dec!(0.01)),
            percent_token: Some("BNB".to_string()),
            flat_fees: vec![],
        };
        let fills = [fill(dec!(100), dec!(1), fee)];
        let ledger = FeeLedger::from_fills(&fills, &pair());
        assert_eq!(ledger.get("BNB"), Some(dec!(1)));
        assert_eq!(ledger.foreign_tokens(&pair()).count(), 1);
    }

    #[test]
    fn test_in_quote_conversion_and_unpriced() {
        let mut ledger = FeeLedger::new();
        ledger.add("USDT".to_string(), dec!(1));
        ledger.add("BTC".to_string(), dec!(0.01));
        ledger.add("BNB".to_string(), dec!(2));
        ledger.add("XYZ".to_string(), dec!(5));

        let rates = HashMap::from([("BNB".to_string(), dec!(300))]);
        let fees = ledger.in_quote(&pair(), dec!(100), &rates);
        assert_eq!(fees.total, dec!(1) + dec!(1) + dec!(600));
        assert_eq!(fees.unpriced, vec!["XYZ".to_string()]);
    }

    #[test]
    fn test_fill_fee_in_quote_converts_base_flat_fee() {
        let fee = TradeFee {
            percent: Some(dec!(0.001)),
            percent_token: None,
            flat_fees: vec![
                FlatFee {
                    token: "USDT".to_string(),
                    amount: dec!(0.5),
                },
                FlatFee {
                    token: "BTC".to_string(),
                    amount: dec!(0.001),
                },
            ],
        };
        let f = fill(dec!(200), dec!(1), fee);
        // 0.2 percent + 0.5 quote + 0.001 × 200 base
        assert_eq!(fill_fee_in_quote(&f, "USDT"), dec!(0.9));
    }

    #[test]
    fn test_zero_percent_fee_is_not_booked() {
        let fills = [fill(dec!(100), dec!(1), TradeFee::percent(Decimal::ZERO))];
        assert!(FeeLedger::from_fills(&fills, &pair()).is_empty());
    }

    #[test]
    fn test_rebate_agrees_between_ledger_and_fill_views() {
        let rebate = fill(dec!(100), dec!(2), TradeFee::percent(dec!(-0.0002)));
        let ledger = FeeLedger::from_fills(std::slice::from_ref(&rebate), &pair());
        assert_eq!(ledger.get("USDT"), Some(dec!(-0.04)));

        let fees = ledger.in_quote(&pair(), dec!(100), &HashMap::new());
        assert_eq!(fees.total, fill_fee_in_quote(&rebate, "USDT"));
    }
}
