//! Safe Ratios - Uniform Zero-Denominator Handling
//!
//! Every derived figure that divides by a quantity which may be zero
//! goes through `safe_div`. An absent result is a typed `None`, never an
//! ad hoc `"0"` string, and it never aborts the surrounding computation.
//! Serializers render it as `"N/A"`.

use rust_decimal::Decimal;
use serde::Serializer;

/// Sentinel written in place of an absent figure.
pub const NOT_AVAILABLE: &str = "N/A";

/// `numerator / denominator`, or `None` when the denominator is zero
/// or the quotient overflows.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Arithmetic mean, or `None` for an empty input.
pub fn mean<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0u32), |(sum, count), v| (sum + v, count + 1));
    safe_div(sum, Decimal::from(count))
}

/// Serialize an optional figure as a decimal string or `"N/A"`.
pub fn serialize_or_na<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

/// Display helper for optional figures.
pub fn display_or_na(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(dec!(10), Decimal::ZERO), None);
        assert_eq!(safe_div(dec!(10), dec!(4)), Some(dec!(2.5)));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::new()), None);
        assert_eq!(mean(vec![dec!(0.1), dec!(0.3)]), Some(dec!(0.2)));
    }

    #[test]
    fn test_serialize_absent_as_na() {
        #[derive(serde::Serialize)]
        struct Row {
            #[serde(serialize_with = "serialize_or_na")]
            value: Option<Decimal>,
        }
        let json = serde_json::to_string(&Row { value: None }).unwrap();
        assert_eq!(json, r#"{"value":"N/A"}"#);
        let json = serde_json::to_string(&Row { value: Some(dec!(1.50)) }).unwrap();
        assert_eq!(json, r#"{"value":"1.50"}"#);
    }
}
