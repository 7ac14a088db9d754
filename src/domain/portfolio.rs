//! Cross-portfolio rows.
//!
//! One row per strategy run, computed over the run's entire recorded
//! history. Balances come from the recorded balance log (earliest entry as
//! start, latest as current), so a row can be produced for runs whose
//! exchange connection is long gone.
//!
//! Every portfolio value is marked at the latest fill price of the run.

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::AnalyticsError;
use super::fees::fill_fee_in_quote;
use super::format::serialize_pct_or_na;
use super::metrics::{AveragePrices, TradeCounts, Volume};
use super::safe_math::{mean, safe_div, serialize_or_na};
use super::trade::{
    sort_chronologically, BalanceBounds, MarketId, StrategyId, TradeFill, TradeSide, TradingPair,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TradeVolumes {
    pub base: Volume,
    pub quote: Volume,
}

/// Start and current balances from the balance log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunBalances {
    #[serde(serialize_with = "serialize_or_na")]
    pub start_base_balance: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub start_quote_balance: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub current_base_balance: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub current_quote_balance: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunPerformance {
    #[serde(serialize_with = "serialize_or_na")]
    pub hold_portfolio_value: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub current_portfolio_value: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub trade_pnl: Option<Decimal>,
    pub fees_paid: Decimal,
    #[serde(serialize_with = "serialize_or_na")]
    pub total_pnl: Option<Decimal>,
    #[serde(rename = "return_percentage", serialize_with = "serialize_pct_or_na")]
    pub return_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccumulationDistribution {
    /// `buy_base − sell_base`.
    pub total_holdings: Decimal,
    pub total_quote_spent: Decimal,
    pub total_quote_received: Decimal,
    /// `total_quote_spent / total_holdings`; absent with no holdings.
    #[serde(serialize_with = "serialize_or_na")]
    pub average_cost_basis: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfitPerformance {
    #[serde(serialize_with = "serialize_or_na")]
    pub unrealized_pnl: Option<Decimal>,
    pub realized_pnl: Decimal,
    /// Realized plus unrealized; an absent unrealized figure adds nothing.
    pub net_pnl: Decimal,
    #[serde(serialize_with = "serialize_or_na")]
    pub effective_sell_buy_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapitalRecycling {
    #[serde(serialize_with = "serialize_or_na")]
    pub quote_available_for_reentry: Option<Decimal>,
    /// Midpoint of the peak fill price and the latest buy price.
    #[serde(serialize_with = "serialize_or_na")]
    pub retracement_buy_trigger_price: Option<Decimal>,
    #[serde(serialize_with = "serialize_or_na")]
    pub reinvestment_amount_per_cycle: Option<Decimal>,
}

/// Lifetime figures of one strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioRow {
    pub strategy_id: StrategyId,
    /// Market of the run's latest fill.
    pub market: MarketId,
    pub trading_pair: String,
    pub number_of_trades: TradeCounts,
    pub total_trade_volume: TradeVolumes,
    /// Plain mean of fill prices per side.
    pub average_price: AveragePrices,
    pub balances: RunBalances,
    pub performance: RunPerformance,
    pub accumulation_distribution: AccumulationDistribution,
    pub profit_performance: ProfitPerformance,
    pub capital_recycling: CapitalRecycling,
    pub latest_price: Decimal,
    #[serde(serialize_with = "serialize_or_na")]
    pub latest_buy_price: Option<Decimal>,
    pub peak_price: Decimal,
}

impl PortfolioRow {
    /// Build the row of `strategy_id` from all of its fills.
    ///
    /// A run that traded several pairs is reported under its latest fill's
    /// market and pair: volumes of every pair are summed and fees convert
    /// against the latest pair's quote token.
    ///
    /// # Errors
    /// `EmptyScope` without fills, `InvalidTradingPair` when the latest
    /// fill's symbol cannot be split into base and quote.
    pub fn compute(
        strategy_id: &str,
        fills: &[TradeFill],
        bounds: Option<&BalanceBounds>,
    ) -> Result<Self, AnalyticsError> {
        let mut ordered: Vec<&TradeFill> = fills.iter().collect();
        sort_chronologically(&mut ordered);
        let Some(latest) = ordered.last() else {
            return Err(AnalyticsError::EmptyScope);
        };
        let pair = TradingPair::parse(&latest.symbol)?;
        let latest_price = latest.price;

        let mut counts = TradeCounts::default();
        let mut volumes = TradeVolumes::default();
        let mut fees_paid = Decimal::ZERO;
        let mut peak_price = latest_price;
        let mut latest_buy_price = None;
        for fill in &ordered {
            match fill.side {
                TradeSide::Buy => {
                    counts.buy += 1;
                    latest_buy_price = Some(fill.price);
                }
                TradeSide::Sell => counts.sell += 1,
            }
            counts.total += 1;
            volumes.base.add(fill.side, fill.amount);
            volumes.quote.add(fill.side, fill.notional());
            fees_paid += fill_fee_in_quote(fill, &pair.quote);
            peak_price = peak_price.max(fill.price);
        }

        let side_mean = |side: TradeSide| {
            mean(ordered.iter().filter(|f| f.side == side).map(|f| f.price))
        };
        let average_price = AveragePrices {
            buy: side_mean(TradeSide::Buy),
            sell: side_mean(TradeSide::Sell),
            total: mean(ordered.iter().map(|f| f.price)),
        };

        let holdings = volumes.base.buy - volumes.base.sell;
        let average_cost_basis = safe_div(volumes.quote.buy, holdings);
        let unrealized_pnl = average_cost_basis.map(|basis| (latest_price - basis) * holdings);
        let realized_pnl = volumes.quote.sell - volumes.quote.buy;
        let effective_sell_buy_price = average_price
            .sell
            .zip(average_price.buy)
            .map(|(sell, buy)| sell - buy);

        let balances = bounds.map_or_else(RunBalances::default, |b| RunBalances {
            start_base_balance: Some(b.earliest.base_balance),
            start_quote_balance: Some(b.earliest.quote_balance),
            current_base_balance: Some(b.latest.base_balance),
            current_quote_balance: Some(b.latest.quote_balance),
        });
        let mark = |base: Option<Decimal>, quote: Option<Decimal>| {
            base.zip(quote).map(|(base, quote)| base * latest_price + quote)
        };
        let hold_value = mark(balances.start_base_balance, balances.start_quote_balance);
        let current_value = mark(balances.current_base_balance, balances.current_quote_balance);
        let trade_pnl = current_value.zip(hold_value).map(|(cur, hold)| cur - hold);
        let total_pnl = trade_pnl.map(|pnl| pnl - fees_paid);
        let return_pct = total_pnl
            .zip(hold_value)
            .and_then(|(pnl, hold)| safe_div(pnl, hold));

        let reentry = balances.current_quote_balance.map(|quote| realized_pnl + quote);

        Ok(Self {
            strategy_id: strategy_id.to_string(),
            market: latest.market.clone(),
            trading_pair: pair.to_string(),
            number_of_trades: counts,
            total_trade_volume: volumes,
            average_price,
            balances,
            performance: RunPerformance {
                hold_portfolio_value: hold_value,
                current_portfolio_value: current_value,
                trade_pnl,
                fees_paid,
                total_pnl,
                return_pct,
            },
            accumulation_distribution: AccumulationDistribution {
                total_holdings: holdings,
                total_quote_spent: volumes.quote.buy,
                total_quote_received: volumes.quote.sell,
                average_cost_basis,
            },
            profit_performance: ProfitPerformance {
                unrealized_pnl,
                realized_pnl,
                net_pnl: realized_pnl + unrealized_pnl.unwrap_or(Decimal::ZERO),
                effective_sell_buy_price,
            },
            capital_recycling: CapitalRecycling {
                quote_available_for_reentry: reentry,
                retracement_buy_trigger_price: latest_buy_price
                    .map(|buy| (peak_price + buy) / Decimal::TWO),
                reinvestment_amount_per_cycle: reentry,
            },
            latest_price,
            latest_buy_price,
            peak_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{FlatFee, RecordedBalance, TradeFee};
    use rust_decimal_macros::dec;

    fn fill(side: TradeSide, price: Decimal, amount: Decimal, ts: i64) -> TradeFill {
        TradeFill {
            market: "kucoin".to_string(),
            symbol: "ETH-USDT".to_string(),
            strategy_id: "conf_vol_1.yml".to_string(),
            side,
            price,
            amount,
            fee: TradeFee::none(),
            timestamp_ms: ts,
            order_id: None,
            exchange_trade_id: None,
        }
    }

    fn bounds(start: (Decimal, Decimal), current: (Decimal, Decimal)) -> BalanceBounds {
        let entry = |(base, quote): (Decimal, Decimal), ts| RecordedBalance {
            strategy_id: "conf_vol_1.yml".to_string(),
            base_balance: base,
            quote_balance: quote,
            created_at_ms: ts,
        };
        BalanceBounds {
            earliest: entry(start, 1),
            latest: entry(current, 2),
        }
    }

    #[test]
    fn test_open_position_row() {
        let fills = vec![
            fill(TradeSide::Buy, dec!(100), dec!(2), 1),
            fill(TradeSide::Sell, dec!(130), dec!(1), 2),
            fill(TradeSide::Buy, dec!(90), dec!(1), 3),
        ];
        let b = bounds((dec!(0), dec!(1000)), (dec!(2), dec!(800)));
        let row = PortfolioRow::compute("conf_vol_1.yml", &fills, Some(&b)).unwrap();

        assert_eq!(row.number_of_trades.total, 3);
        assert_eq!(row.accumulation_distribution.total_holdings, dec!(2));
        assert_eq!(row.accumulation_distribution.total_quote_spent, dec!(290));
        assert_eq!(row.accumulation_distribution.average_cost_basis, Some(dec!(145)));
        // (90 − 145) × 2
        assert_eq!(row.profit_performance.unrealized_pnl, Some(dec!(-110)));
        assert_eq!(row.profit_performance.realized_pnl, dec!(-160));
        assert_eq!(row.profit_performance.net_pnl, dec!(-270));
        assert_eq!(row.average_price.buy, Some(dec!(95)));
        assert_eq!(row.profit_performance.effective_sell_buy_price, Some(dec!(35)));
        assert_eq!(row.latest_price, dec!(90));
        assert_eq!(row.peak_price, dec!(130));
        assert_eq!(row.capital_recycling.retracement_buy_trigger_price, Some(dec!(110)));
        assert_eq!(row.capital_recycling.quote_available_for_reentry, Some(dec!(640)));
        // hold 0×90+1000, current 2×90+800
        assert_eq!(row.performance.hold_portfolio_value, Some(dec!(1000)));
        assert_eq!(row.performance.current_portfolio_value, Some(dec!(980)));
        assert_eq!(row.performance.return_pct, Some(dec!(-0.02)));
    }

    #[test]
    fn test_flat_position_keeps_row_with_absent_basis() {
        let fills = vec![
            fill(TradeSide::Buy, dec!(100), dec!(1), 1),
            fill(TradeSide::Sell, dec!(120), dec!(1), 2),
        ];
        let row = PortfolioRow::compute("conf_vol_1.yml", &fills, None).unwrap();
        assert_eq!(row.accumulation_distribution.total_holdings, Decimal::ZERO);
        assert_eq!(row.accumulation_distribution.average_cost_basis, None);
        assert_eq!(row.profit_performance.unrealized_pnl, None);
        assert_eq!(row.profit_performance.net_pnl, dec!(20));
        assert_eq!(row.performance.hold_portfolio_value, None);
        assert_eq!(row.capital_recycling.quote_available_for_reentry, None);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["accumulation_distribution"]["average_cost_basis"], "N/A");
        assert_eq!(json["performance"]["return_percentage"], "N/A");
    }

    #[test]
    fn test_sell_only_run_has_no_retracement_trigger() {
        let fills = vec![fill(TradeSide::Sell, dec!(100), dec!(1), 1)];
        let row = PortfolioRow::compute("conf_vol_1.yml", &fills, None).unwrap();
        assert_eq!(row.latest_buy_price, None);
        assert_eq!(row.capital_recycling.retracement_buy_trigger_price, None);
        assert_eq!(row.average_price.buy, None);
        assert_eq!(row.profit_performance.effective_sell_buy_price, None);
    }

    #[test]
    fn test_fees_summed_at_fill_price() {
        let mut a = fill(TradeSide::Buy, dec!(100), dec!(1), 1);
        a.fee = TradeFee::percent(dec!(0.01));
        let mut b = fill(TradeSide::Sell, dec!(200), dec!(1), 2);
        b.fee = TradeFee::flat("ETH", dec!(0.01));
        let row = PortfolioRow::compute("conf_vol_1.yml", &[a, b], None).unwrap();
        assert_eq!(row.performance.fees_paid, dec!(3));
    }

    #[test]
    fn test_market_follows_latest_fill() {
        let first = fill(TradeSide::Buy, dec!(100), dec!(1), 1);
        let mut second = fill(TradeSide::Buy, dec!(100), dec!(1), 2);
        second.market = "gate_io".to_string();
        let row = PortfolioRow::compute("conf_vol_1.yml", &[second, first], None).unwrap();
        assert_eq!(row.market, "gate_io");
    }

    #[test]
    fn test_multi_pair_run_reported_under_latest_pair() {
        let mut eth = fill(TradeSide::Buy, dec!(100), dec!(1), 1);
        eth.fee = TradeFee {
            percent: None,
            percent_token: None,
            flat_fees: vec![FlatFee {
                token: "USDT".to_string(),
                amount: dec!(1),
            }],
        };
        let mut btc = fill(TradeSide::Sell, dec!(200), dec!(0.5), 2);
        btc.market = "gate_io".to_string();
        btc.symbol = "BTC-USDC".to_string();

        let row = PortfolioRow::compute("conf_vol_1.yml", &[btc, eth], None).unwrap();
        assert_eq!(row.market, "gate_io");
        assert_eq!(row.trading_pair, "BTC-USDC");
        assert_eq!(row.total_trade_volume.base.total, dec!(1.5));
        assert_eq!(row.total_trade_volume.quote.buy, dec!(100));
        assert_eq!(row.total_trade_volume.quote.sell, dec!(100));
        assert_eq!(row.profit_performance.realized_pnl, Decimal::ZERO);
        assert_eq!(row.accumulation_distribution.total_holdings, dec!(0.5));
        assert_eq!(row.latest_price, dec!(200));
        // USDT is not the USDC quote, so the flat fee converts at the fill price
        assert_eq!(row.performance.fees_paid, dec!(100));
    }
}
