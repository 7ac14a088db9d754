//! Numeric display formatting.
//!
//! Output-compatibility rules for report figures: decimals as strings,
//! percentages with two places, and a magnitude-banded "smart" rounding
//! that keeps significant digits for very small quantities.

use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::safe_math::NOT_AVAILABLE;

/// Round `value` for display.
///
/// With an explicit `precision`, rounds half-to-even to that many decimal
/// places. Without one, truncates to a step chosen by magnitude band:
///
/// | |value|            | step       |
/// |--------------------|------------|
/// | (100, 10000)       | 0.1        |
/// | (1, 100)           | 0.01       |
/// | (0.01, 1)          | 0.0001     |
/// | (0.0001, 0.01)     | 0.00001    |
/// | (0, 0.0001)        | 0.00000001 |
/// | anything else      | 1          |
pub fn smart_round(value: Decimal, precision: Option<u32>) -> Decimal {
    if let Some(dp) = precision {
        return value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    }
    let magnitude = value.abs();
    let dp = if magnitude > dec!(100) && magnitude < dec!(10000) {
        1
    } else if magnitude > dec!(1) && magnitude < dec!(100) {
        2
    } else if magnitude > dec!(0.01) && magnitude < dec!(1) {
        4
    } else if magnitude > dec!(0.0001) && magnitude < dec!(0.01) {
        5
    } else if magnitude > Decimal::ZERO && magnitude < dec!(0.0001) {
        8
    } else {
        0
    };
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// `smart_round` over an optional figure, rendered as a string.
pub fn round_or_na(value: Option<Decimal>, precision: Option<u32>) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| smart_round(v, precision).to_string(),
    )
}

/// Format a ratio as a percentage with two decimal places (`0.1234` → `12.34%`).
pub fn format_pct(ratio: Decimal) -> String {
    let pct = (ratio * dec!(100)).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    format!("{pct:.2}%")
}

/// Percentage of an optional ratio, `"N/A"` when absent.
pub fn format_pct_or_na(ratio: Option<Decimal>) -> String {
    ratio.map_or_else(|| NOT_AVAILABLE.to_string(), format_pct)
}

/// Serialize an optional ratio as a percentage string or `"N/A"`.
pub fn serialize_pct_or_na<S>(ratio: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_pct_or_na(*ratio))
}

/// Render a duration as `"{days} days HH:MM:SS"`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{sign}{days} days {hours:02}:{minutes:02}:{seconds:02}")
}
