//! Metric Calculator - Per-Market Performance Metrics
//!
//! Pure mapping from the fills of exactly one (market, trading pair) scope
//! plus that market's balance snapshot to a `PerformanceMetrics` value.
//! No I/O: prices and fee rates that need a lookup are resolved by the
//! caller and passed in through `PricingContext`.
//!
//! Balance convention: the window-start balance is inferred by walking the
//! fills backward from the current balance (`reconstruct_start_balance`).
//! Deposits or withdrawals made during the window are not observable here
//! and skew the inferred start balance.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::AnalyticsError;
use super::fees::FeeLedger;
use super::safe_math::{safe_div, serialize_or_na};
use super::trade::{
    sort_chronologically, BalanceSnapshot, DerivativeMarkets, Token, TradeFill, TradeSide,
    TradingPair,
};

/// Buy / sell / total trade counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TradeCounts {
    pub buy: usize,
    pub sell: usize,
    pub total: usize,
}

/// Buy / sell / total volume in one unit (base or quote).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub buy: Decimal,
    pub sell: Decimal,
    pub total: Decimal,
}

impl Volume {
    pub(crate) fn add(&mut self, side: TradeSide, amount: Decimal) {
        match side {
            TradeSide::Buy => self.buy += amount,
            TradeSide::Sell => self.sell += amount,
        }
        self.total += amount;
    }
}

/// Volume-weighted average prices; absent when the side has no volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AveragePrices {
    #[serde(serialize_with = "serialize_or_na")]
    pub buy: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub sell: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub total: Option<Decimal>,
}

/// Prices and lookups resolved by the caller before calculation.
#[derive(Debug, Clone, Default)]
pub struct PricingContext {
    /// Current price of the pair. Falls back to the latest fill price.
    pub current_price: Option<Decimal>,
    /// Quote-currency rates for fee tokens other than base and quote.
    pub fee_rates: HashMap<Token, Decimal>,
}

/// Performance of one (market, trading pair) scope over a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub market: String,
    pub trading_pair: String,
    pub base_token: Token,
    pub quote_token: Token,
    /// Derivative markets report no spot base holdings.
    pub is_derivative: bool,
    /// Start of the report window (Unix ms).
    pub window_start_ms: i64,

    pub trades: TradeCounts,
    pub base_volume: Volume,
    pub quote_volume: Volume,
    /// `buy_base − sell_base`.
    pub net_base_change: Decimal,
    /// `sell_quote − buy_quote`.
    pub net_quote_change: Decimal,
    pub average_price: AveragePrices,

    #[serde(serialize_with = "serialize_or_na")]
    pub start_base_balance: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub current_base_balance: Option<Decimal>,
    pub start_quote_balance: Decimal,
    pub current_quote_balance: Decimal,

    pub start_price: Decimal,
    pub current_price: Decimal,
    #[serde(serialize_with = "serialize_or_na")]
    pub start_base_ratio: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub current_base_ratio: Option<Decimal>,

    pub hold_value: Decimal,
    pub current_value: Decimal,
    pub trade_pnl: Decimal,
    pub fees: FeeLedger,
    pub fee_in_quote: Decimal,
    pub unpriced_fee_tokens: Vec<Token>,
    pub total_pnl: Decimal,
    #[serde(serialize_with = "serialize_or_na")]
    pub return_pct: Option<Decimal>,
}

/// Infer the window-start balance from the current balance and the net
/// change the fills made to it: `current − net_delta`.
///
/// Assumes no external transfers during the window.
pub fn reconstruct_start_balance(current: Decimal, net_delta: Decimal) -> Decimal {
    current - net_delta
}

/// Share of the portfolio value held in the base asset.
fn base_ratio(base: Decimal, quote: Decimal, price: Decimal) -> Option<Decimal> {
    let base_value = base * price;
    safe_div(base_value, base_value + quote)
}

/// Stateless calculator for per-market performance metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricCalculator {
    derivatives: DerivativeMarkets,
}

impl MetricCalculator {
    pub fn new(derivatives: DerivativeMarkets) -> Self {
        Self { derivatives }
    }

    /// Compute the metrics of one scope.
    ///
    /// `trades` must all belong to (`market`, `symbol`); the caller groups
    /// them. Input order does not matter.
    ///
    /// # Errors
    /// `EmptyScope` when `trades` is empty, `InvalidTradingPair` when the
    /// symbol is not `BASE-QUOTE`.
    pub fn calculate(
        &self,
        market: &str,
        symbol: &str,
        trades: &[TradeFill],
        balances: &BalanceSnapshot,
        window_start_ms: i64,
        pricing: &PricingContext,
    ) -> Result<PerformanceMetrics, AnalyticsError> {
        let mut ordered: Vec<&TradeFill> = trades.iter().collect();
        sort_chronologically(&mut ordered);
        let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
            return Err(AnalyticsError::EmptyScope);
        };
        let pair = TradingPair::parse(symbol)?;
        let start_price = first.price;
        let current_price = pricing.current_price.unwrap_or(last.price);

        let mut counts = TradeCounts::default();
        let mut base_volume = Volume::default();
        let mut quote_volume = Volume::default();
        for fill in &ordered {
            match fill.side {
                TradeSide::Buy => counts.buy += 1,
                TradeSide::Sell => counts.sell += 1,
            }
            counts.total += 1;
            base_volume.add(fill.side, fill.amount);
            quote_volume.add(fill.side, fill.notional());
        }

        let average_price = AveragePrices {
            buy: safe_div(quote_volume.buy, base_volume.buy),
            sell: safe_div(quote_volume.sell, base_volume.sell),
            total: safe_div(quote_volume.total, base_volume.total),
        };

        let net_base_change = base_volume.buy - base_volume.sell;
        let net_quote_change = quote_volume.sell - quote_volume.buy;

        let current_base = balances.get(&pair.base);
        let current_quote = balances.get(&pair.quote);
        let start_base = reconstruct_start_balance(current_base, net_base_change);
        let start_quote = reconstruct_start_balance(current_quote, net_quote_change);

        let hold_value = start_base * current_price + start_quote;
        let current_value = current_base * current_price + current_quote;
        let trade_pnl = current_value - hold_value;

        let fees = FeeLedger::from_fills(ordered.iter().copied(), &pair);
        let quote_fees = fees.in_quote(&pair, current_price, &pricing.fee_rates);
        let total_pnl = trade_pnl - quote_fees.total;
        let return_pct = safe_div(total_pnl, hold_value);

        let is_derivative = self.derivatives.contains(market);
        let spot_only = |value: Option<Decimal>| if is_derivative { None } else { value };

        Ok(PerformanceMetrics {
            market: market.to_string(),
            trading_pair: pair.to_string(),
            base_token: pair.base.clone(),
            quote_token: pair.quote.clone(),
            is_derivative,
            window_start_ms,
            trades: counts,
            base_volume,
            quote_volume,
            net_base_change,
            net_quote_change,
            average_price,
            start_base_balance: spot_only(Some(start_base)),
            current_base_balance: spot_only(Some(current_base)),
            start_quote_balance: start_quote,
            current_quote_balance: current_quote,
            start_price,
            current_price,
            start_base_ratio: spot_only(base_ratio(start_base, start_quote, start_price)),
            current_base_ratio: spot_only(base_ratio(current_base, current_quote, current_price)),
            hold_value,
            current_value,
            trade_pnl,
            fees,
            fee_in_quote: quote_fees.total,
            unpriced_fee_tokens: quote_fees.unpriced,
            total_pnl,
            return_pct,
        })
    }
}
