//! Amount normalization between human-readable decimals and base units
//!
//! Human amounts are handled as `rust_decimal::Decimal` and base units as
//! `U256`, so conversions for the usual 6–18 decimal tokens never pass
//! through floating point. Floats appear only at the display edge
//! ([`to_human`]).

use crate::{Error, Result};
use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Convert a human amount into integer base units
///
/// Computes `round(amount * 10^decimals)`, rounding half away from zero.
/// Negative amounts are rejected; amounts that round to zero come back as
/// `U256::ZERO` and are caught by [`ensure_non_degenerate`].
pub fn to_base_units(amount: &Decimal, decimals: u8) -> Result<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidArgument(format!(
            "Amount must not be negative: {}",
            amount
        )));
    }

    let rounded = amount
        .round_dp_with_strategy(u32::from(decimals), RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let repr = rounded.abs().to_string();

    let (whole, fraction) = match repr.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (repr.as_str(), ""),
    };

    let width = usize::from(decimals);
    let digits = format!("{}{:0<width$}", whole, fraction, width = width);

    U256::from_str_radix(&digits, 10).map_err(|e| {
        Error::InvalidArgument(format!("Amount {} does not fit in base units: {}", amount, e))
    })
}

/// Convert integer base units into a human amount for display
pub fn to_human(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals)
        .parse::<f64>()
        .unwrap_or_default()
}

/// Exact decimal string for a base-unit amount (trailing zeros trimmed)
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let remainder_str = format!("{:0>width$}", remainder, width = usize::from(decimals));
    let trimmed = remainder_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

/// Reject base-unit amounts that would produce a degenerate quote request
pub fn ensure_non_degenerate(base_units: U256) -> Result<U256> {
    if base_units.is_zero() {
        return Err(Error::DegenerateAmount(
            "amount rounds to zero base units".to_string(),
        ));
    }
    Ok(base_units)
}

/// Parse a user-entered amount string ("2", "0.5", "1e-3")
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| Error::InvalidArgument(format!("Invalid amount '{}': {}", raw, e)))
}

/// Convert an extracted floating-point amount into a decimal
///
/// Goes through the shortest round-trip representation of the float, so
/// `0.1` becomes exactly `0.1` rather than its binary expansion.
pub fn decimal_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::InvalidArgument(format!("Invalid amount: {}", value)));
    }
    parse_amount(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_base_units_common_decimals() {
        assert_eq!(
            to_base_units(&dec("2"), 18).unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
        assert_eq!(to_base_units(&dec("100"), 6).unwrap(), U256::from(100_000_000u64));
        assert_eq!(to_base_units(&dec("0.1"), 18).unwrap(), U256::from(100_000_000_000_000_000u128));
        assert_eq!(to_base_units(&dec("1.5"), 8).unwrap(), U256::from(150_000_000u64));
        assert_eq!(to_base_units(&dec("42"), 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_to_base_units_rounds_half_away_from_zero() {
        assert_eq!(to_base_units(&dec("1.0000005"), 6).unwrap(), U256::from(1_000_001u64));
        assert_eq!(to_base_units(&dec("1.0000004"), 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(to_base_units(&dec("0.0000001"), 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_base_units_rejects_negative() {
        assert!(to_base_units(&dec("-1"), 18).is_err());
    }

    #[test]
    fn test_to_base_units_large_amount() {
        let amount = dec("123456789.123456789");
        assert_eq!(
            to_base_units(&amount, 18).unwrap(),
            U256::from_str_radix("123456789123456789000000000", 10).unwrap()
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(1_000_000_000_000_000_000u128), 18), "1");
        assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u128), 18), "1.5");
        assert_eq!(format_units(U256::from(1_000_000_000u64), 6), "1000");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
    }

    #[test]
    fn test_to_human() {
        assert_eq!(to_human(U256::from(4_000_000_000u64), 6), 4000.0);
        assert_eq!(to_human(U256::from(2_000_000_000_000_000_000u128), 18), 2.0);
        assert_eq!(to_human(U256::ZERO, 18), 0.0);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let values: [u128; 5] = [1, 999_999, 123_456_789_012, 2_000_000_000_000_000_000, 31_415_926];
        for decimals in [6u8, 8, 12, 18] {
            for raw in values {
                let x = U256::from(raw);
                let human = decimal_from_f64(to_human(x, decimals)).unwrap();
                let back = to_base_units(&human, decimals).unwrap();
                let diff = if back > x { back - x } else { x - back };
                assert!(
                    diff <= U256::from(1u8),
                    "round trip drifted for {} at {} decimals: {}",
                    raw,
                    decimals,
                    back
                );
            }
        }
    }

    #[test]
    fn test_ensure_non_degenerate() {
        assert!(ensure_non_degenerate(U256::ZERO).is_err());
        assert_eq!(ensure_non_degenerate(U256::from(1u8)).unwrap(), U256::from(1u8));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 2.5 ").unwrap(), dec("2.5"));
        assert_eq!(parse_amount("1e-3").unwrap(), dec("0.001"));
        assert!(parse_amount("two").is_err());
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64(0.1).unwrap(), dec("0.1"));
        assert_eq!(decimal_from_f64(2.0).unwrap(), dec("2"));
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(f64::INFINITY).is_err());
    }
}
