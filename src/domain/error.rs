use thiserror::Error;

/// Failures of the pure calculators.
///
/// Zero denominators are not errors: ratios degrade to an absent value
/// (see `safe_math`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Cannot compute performance metrics on an empty trade set")]
    EmptyScope,

    #[error("Invalid trading pair symbol '{0}', expected BASE-QUOTE")]
    InvalidTradingPair(String),
}
