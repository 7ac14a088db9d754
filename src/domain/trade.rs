//! Core trade-log domain types.
//!
//! Defines the recorded entities the analytics engine reads: executed
//! fills, their fee structures, trading pairs, balance snapshots and the
//! recorded balance log. These types are the inner ring of the hexagonal
//! architecture: serializable, immutable once recorded, free of I/O.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AnalyticsError;

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Exchange / connector name a fill was executed on (e.g. `binance`).
pub type MarketId = String;

/// Identifier of the strategy run (config file) a fill was executed under.
pub type StrategyId = String;

/// Asset symbol (e.g. `BTC`, `USDT`).
pub type Token = String;

// ────────────────────────────────────────────
// Fills
// ────────────────────────────────────────────

/// Trade side as recorded in the trade log.
///
/// The log is written by several strategy engines, so lowercase and
/// capitalized spellings are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    #[serde(rename = "BUY", alias = "buy", alias = "Buy")]
    Buy,
    #[serde(rename = "SELL", alias = "sell", alias = "Sell")]
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A flat fee charged in a specific token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatFee {
    /// Token the fee was charged in.
    pub token: Token,
    /// Fee amount in `token` units.
    pub amount: Decimal,
}

/// Fee structure attached to a fill.
///
/// A fill may carry a percentage fee, any number of flat fees, both,
/// or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFee {
    /// Fraction of the notional charged (0.001 = 0.1%).
    #[serde(default)]
    pub percent: Option<Decimal>,
    /// Token the percentage fee is paid in. Defaults to the quote token.
    #[serde(default)]
    pub percent_token: Option<Token>,
    /// Flat fees, each in its own token.
    #[serde(default)]
    pub flat_fees: Vec<FlatFee>,
}

impl TradeFee {
    /// A fee-free fill.
    pub fn none() -> Self {
        Self::default()
    }

    /// A pure percentage fee.
    pub fn percent(percent: Decimal) -> Self {
        Self {
            percent: Some(percent),
            ..Self::default()
        }
    }

    /// A single flat fee.
    pub fn flat(token: &str, amount: Decimal) -> Self {
        Self {
            flat_fees: vec![FlatFee {
                token: token.to_string(),
                amount,
            }],
            ..Self::default()
        }
    }
}

/// One executed trade, as recorded by the strategy layer.
///
/// Append-only: created once, never mutated, retained indefinitely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFill {
    /// Exchange the fill was executed on.
    pub market: MarketId,
    /// Trading pair symbol in `BASE-QUOTE` form.
    pub symbol: String,
    /// Strategy run the fill was executed under.
    #[serde(alias = "config_file_path")]
    pub strategy_id: StrategyId,
    /// Buy or sell.
    #[serde(alias = "trade_type")]
    pub side: TradeSide,
    /// Execution price in quote units.
    pub price: Decimal,
    /// Executed amount in base units.
    pub amount: Decimal,
    /// Fees charged for this fill.
    #[serde(default, alias = "trade_fee")]
    pub fee: TradeFee,
    /// Execution time (Unix ms).
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// Client order ID, when the strategy recorded one.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Exchange-assigned trade ID, when available.
    #[serde(default)]
    pub exchange_trade_id: Option<String>,
}

impl TradeFill {
    /// Notional value of the fill in quote units.
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }

    pub fn is_buy(&self) -> bool {
        self.side == TradeSide::Buy
    }

    /// Whether the fill carries both a market and a strategy run.
    pub fn is_resolvable(&self) -> bool {
        !self.market.trim().is_empty() && !self.strategy_id.trim().is_empty()
    }
}

/// Sorts fills chronologically with a total tie-break so that any
/// permutation of the same fills ends up in the same order.
pub fn sort_chronologically(trades: &mut [&TradeFill]) {
    trades.sort_by(|a, b| {
        a.timestamp_ms
            .cmp(&b.timestamp_ms)
            .then_with(|| a.price.cmp(&b.price))
            .then_with(|| a.amount.cmp(&b.amount))
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
}

// ────────────────────────────────────────────
// Trading pairs and markets
// ────────────────────────────────────────────

/// A `BASE-QUOTE` trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradingPair {
    pub base: Token,
    pub quote: Token,
}

impl TradingPair {
    /// Parse a `BASE-QUOTE` symbol.
    pub fn parse(symbol: &str) -> Result<Self, AnalyticsError> {
        match symbol.split_once('-') {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains('-') =>
            {
                Ok(Self {
                    base: base.to_string(),
                    quote: quote.to_string(),
                })
            }
            _ => Err(AnalyticsError::InvalidTradingPair(symbol.to_string())),
        }
    }

    /// The pair symbol a rate for `token` in this pair's quote would use.
    pub fn rate_symbol_for(&self, token: &str) -> String {
        format!("{token}-{}", self.quote)
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

/// Recognizes derivative / margined markets, which have no spot base
/// holding to report.
#[derive(Debug, Clone)]
pub struct DerivativeMarkets {
    /// Explicitly configured derivative market names.
    names: HashSet<MarketId>,
    /// Name suffix identifying derivative connectors (e.g. `_perpetual`).
    suffix: Option<String>,
}

impl DerivativeMarkets {
    pub fn new(names: impl IntoIterator<Item = MarketId>, suffix: Option<String>) -> Self {
        Self {
            names: names.into_iter().collect(),
            suffix: suffix.filter(|s| !s.is_empty()),
        }
    }

    /// No market is treated as a derivative.
    pub fn none() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn contains(&self, market: &str) -> bool {
        self.names.contains(market)
            || self
                .suffix
                .as_deref()
                .is_some_and(|suffix| market.ends_with(suffix))
    }
}

impl Default for DerivativeMarkets {
    fn default() -> Self {
        Self::new(Vec::new(), Some("_perpetual".to_string()))
    }
}

// ────────────────────────────────────────────
// Balances
// ────────────────────────────────────────────

/// Holdings per asset for one market at report time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSnapshot(BTreeMap<Token, Decimal>);

impl BalanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held of `token`; assets not present read as zero.
    pub fn get(&self, token: &str) -> Decimal {
        self.0.get(token).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn insert(&mut self, token: impl Into<Token>, amount: Decimal) {
        self.0.insert(token.into(), amount);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Decimal)> {
        self.0.iter()
    }
}

impl FromIterator<(Token, Decimal)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (Token, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One entry of the recorded balance log written by a strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedBalance {
    /// Strategy run the balances belong to.
    #[serde(alias = "bot")]
    pub strategy_id: StrategyId,
    /// Base token holdings.
    #[serde(alias = "total_token")]
    pub base_balance: Decimal,
    /// Quote token holdings.
    #[serde(alias = "total_currency")]
    pub quote_balance: Decimal,
    /// When the entry was recorded (Unix ms).
    #[serde(rename = "created_at")]
    pub created_at_ms: i64,
}

impl RecordedBalance {
    /// Expand into a snapshot keyed by the pair's tokens.
    pub fn to_snapshot(&self, pair: &TradingPair) -> BalanceSnapshot {
        [
            (pair.base.clone(), self.base_balance),
            (pair.quote.clone(), self.quote_balance),
        ]
        .into_iter()
        .collect()
    }
}

/// Earliest and latest recorded balances of a strategy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceBounds {
    pub earliest: RecordedBalance,
    pub latest: RecordedBalance,
}
