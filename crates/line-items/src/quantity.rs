//! Line item quantities: parsing, validation and the stored representation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Decimal places a stored quantity always carries.
pub const QUANTITY_SCALE: u32 = 2;

/// Most decimal places a decimal can carry.
const MAX_SCALE: u32 = 28;

/// Significant digits kept from the input; later digits are truncated.
const MAX_SIGNIFICANT_DIGITS: usize = 28;

/// Integer digits of `Decimal::MAX`.
const MAX_INTEGER_DIGITS: i64 = 29;

/// Why a raw quantity input was rejected.
///
/// The messages are shown to the end user next to the quantity input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("You must specify a positive number for the quantity")]
    NotNumeric,

    #[error("You must specify a positive number for the quantity")]
    NotPositive,

    #[error("You must specify a whole number for the quantity.")]
    NotWholeNumber,
}

/// Which numbers the quantity input accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityDatatype {
    Integer,
    Decimal,
}

impl QuantityDatatype {
    pub fn requires_integer(self) -> bool {
        matches!(self, QuantityDatatype::Integer)
    }
}

/// A validated, strictly positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn one() -> Self {
        Self::from_stored(Decimal::ONE)
    }

    /// Accept an already-numeric value; it must be strictly positive.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, QuantityError> {
        if value <= Decimal::ZERO {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(value))
    }

    /// The value as entered.
    pub fn raw(self) -> Decimal {
        self.0
    }

    /// The stored value: rounded half away from zero to [`QUANTITY_SCALE`]
    /// places, with exactly that many decimals (`3` becomes `3.00`).
    pub fn value(self) -> Decimal {
        let mut stored = self
            .0
            .round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        stored.rescale(QUANTITY_SCALE);
        stored
    }

    /// The stored form of this quantity, as a new `Quantity`.
    pub fn normalized(self) -> Self {
        Self(self.value())
    }

    /// Whole part of the quantity, as shown in an integer input.
    pub fn whole_units(self) -> Decimal {
        self.0.trunc()
    }

    pub fn is_whole(self) -> bool {
        self.0.fract().is_zero()
    }

    fn from_stored(value: Decimal) -> Self {
        Self(value).normalized()
    }
}

impl core::fmt::Display for Quantity {
    /// Always two decimals: `3` formats as `3.00`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.value(), f)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::one()
    }
}

/// Validate a raw quantity input.
///
/// Surrounding whitespace is ignored. Accepted: optional sign, digits with an
/// optional fractional part, optional exponent (`1e2`, `2.5E-1`).
pub fn validate_quantity(raw: &str, require_integer: bool) -> Result<Quantity, QuantityError> {
    let value = parse_number(raw).ok_or(QuantityError::NotNumeric)?;
    if value <= Decimal::ZERO {
        return Err(QuantityError::NotPositive);
    }
    if require_integer && !value.fract().is_zero() {
        return Err(QuantityError::NotWholeNumber);
    }
    Ok(Quantity(value))
}

/// Parse a numeric string into a decimal, `None` if it is not a number.
///
/// Whether the input is a number depends on its syntax alone. Magnitudes a
/// decimal cannot hold are clamped: positive values below
/// [`smallest_positive`] become that value and values above `Decimal::MAX`
/// become `Decimal::MAX`, so the sign and zero-ness always match the input.
fn parse_number(raw: &str) -> Option<Decimal> {
    let input = raw.trim();
    let (mantissa, exponent) = match input.find(['e', 'E']) {
        Some(pos) => (&input[..pos], Some(&input[pos + 1..])),
        None => (input, None),
    };

    let (negative, digits) = match mantissa.as_bytes().first()? {
        b'-' => (true, &mantissa[1..]),
        b'+' => (false, &mantissa[1..]),
        _ => (false, mantissa),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exponent = match exponent {
        Some(exponent) => parse_exponent(exponent)?,
        None => 0,
    };

    let magnitude = magnitude_from_digits(int_part, frac_part, exponent);
    Some(if negative { -magnitude } else { magnitude })
}

/// Exponent digits with an optional sign. Any number of digits is accepted;
/// the value saturates at the `i64` range.
fn parse_exponent(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Smallest positive quantity a decimal can hold (`1e-28`).
pub fn smallest_positive() -> Decimal {
    Decimal::new(1, MAX_SCALE)
}

/// `int_part.frac_part × 10^exponent` as a non-negative decimal.
fn magnitude_from_digits(int_part: &str, frac_part: &str, exponent: i64) -> Decimal {
    let all_digits = format!("{int_part}{frac_part}");
    let significant = all_digits.trim_start_matches('0');
    if significant.is_empty() {
        return Decimal::ZERO;
    }

    // value == digits × 10^shift
    let mut digits = significant;
    let mut shift = exponent.saturating_sub(frac_part.len() as i64);
    if digits.len() > MAX_SIGNIFICANT_DIGITS {
        shift = shift.saturating_add((digits.len() - MAX_SIGNIFICANT_DIGITS) as i64);
        digits = &digits[..MAX_SIGNIFICANT_DIGITS];
    }
    let trimmed = digits.trim_end_matches('0');
    shift = shift.saturating_add((digits.len() - trimmed.len()) as i64);
    digits = trimmed;

    let min_shift = -i64::from(MAX_SCALE);
    if shift < min_shift {
        let dropped = min_shift.saturating_sub(shift);
        if dropped >= digits.len() as i64 {
            debug!(exponent, "quantity below the smallest decimal, clamping");
            return smallest_positive();
        }
        digits = &digits[..digits.len() - dropped as usize];
        shift = min_shift;
    }

    let zeros = shift.max(0);
    if (digits.len() as i64).saturating_add(zeros) > MAX_INTEGER_DIGITS {
        debug!(exponent, "quantity above the largest decimal, clamping");
        return Decimal::MAX;
    }
    let scale = u32::try_from(-shift.min(0)).unwrap_or(MAX_SCALE);
    digits
        .parse::<i128>()
        .ok()
        .and_then(|m| m.checked_mul(10i128.pow(zeros as u32)))
        .and_then(|m| Decimal::try_from_i128_with_scale(m, scale).ok())
        .unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_positive_numbers() {
        assert_eq!(validate_quantity("3", true).unwrap().raw(), dec!(3));
        assert_eq!(validate_quantity("2.5", false).unwrap().raw(), dec!(2.5));
        assert_eq!(validate_quantity(" 4 ", true).unwrap().raw(), dec!(4));
        assert_eq!(validate_quantity("+7", true).unwrap().raw(), dec!(7));
        assert_eq!(validate_quantity(".5", false).unwrap().raw(), dec!(0.5));
        assert_eq!(validate_quantity("5.", true).unwrap().raw(), dec!(5));
    }

    #[test]
    fn accepts_exponent_notation() {
        assert_eq!(validate_quantity("1e2", true).unwrap().raw(), dec!(100));
        assert_eq!(validate_quantity("2.5E-1", false).unwrap().raw(), dec!(0.25));
        assert_eq!(validate_quantity("3.0e+1", true).unwrap().raw(), dec!(30));
    }

    #[test]
    fn rejects_non_numeric_input() {
        for raw in ["", "   ", "abc", "1,5", "1_000", "3 apples", "--1", ".", "e5", "1e", "1e+", "0x10", "1.2.3"] {
            assert_eq!(
                validate_quantity(raw, false),
                Err(QuantityError::NotNumeric),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn rejects_zero_and_negative() {
        for raw in ["0", "0.00", "-1", "-0.5", "-0"] {
            assert_eq!(
                validate_quantity(raw, false),
                Err(QuantityError::NotPositive),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn tiny_positive_numbers_are_positive() {
        for raw in ["1e-29", "0.1e-28", "0.00000000000000000000000000001", "1e-999999999999999999999"] {
            let q = validate_quantity(raw, false).unwrap_or_else(|e| panic!("input {raw:?}: {e:?}"));
            assert_eq!(q.raw(), smallest_positive(), "input {raw:?}");
            assert_eq!(q.to_string(), "0.00", "input {raw:?}");
        }
        assert_eq!(validate_quantity("1e-29", true), Err(QuantityError::NotWholeNumber));
    }

    #[test]
    fn small_numbers_keep_twenty_eight_places() {
        assert_eq!(validate_quantity("1e-28", false).unwrap().raw(), smallest_positive());
        assert_eq!(validate_quantity("3.5e-27", false).unwrap().raw(), Decimal::new(35, 28));
        assert_eq!(validate_quantity("19e-29", false).unwrap().raw(), smallest_positive());
    }

    #[test]
    fn huge_numbers_clamp_to_the_largest_decimal() {
        for raw in ["1e29", "1e300", "123456789012345678901234567890", "1e99999999999999999999"] {
            let q = validate_quantity(raw, true).unwrap_or_else(|e| panic!("input {raw:?}: {e:?}"));
            assert_eq!(q.raw(), Decimal::MAX, "input {raw:?}");
        }
        assert_eq!(validate_quantity("1e28", true).unwrap().raw(), Decimal::from_i128_with_scale(10i128.pow(28), 0));
    }

    #[test]
    fn out_of_range_non_positive_numbers_are_not_positive() {
        for raw in ["-1e300", "-1e-29", "0e999", "0.000e-50", "-0.0e5"] {
            assert_eq!(
                validate_quantity(raw, false),
                Err(QuantityError::NotPositive),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn long_mantissas_keep_their_leading_digits() {
        let q = validate_quantity("1.00000000000000000000000000000000009", false).unwrap();
        assert_eq!(q.raw(), Decimal::ONE);
        assert_eq!(validate_quantity("0001.50", false).unwrap().raw(), dec!(1.5));
    }

    #[test]
    fn positivity_is_checked_before_wholeness() {
        assert_eq!(validate_quantity("-2.5", true), Err(QuantityError::NotPositive));
    }

    #[test]
    fn integer_datatype_rejects_fractions() {
        assert_eq!(validate_quantity("2.5", true), Err(QuantityError::NotWholeNumber));
        assert!(validate_quantity("2.00", true).is_ok());
    }

    #[test]
    fn stored_value_has_two_decimals() {
        let q = validate_quantity("3", true).unwrap();
        assert_eq!(q.to_string(), "3.00");
        assert_eq!(q.value().scale(), QUANTITY_SCALE);

        let q = validate_quantity("1.005", false).unwrap();
        assert_eq!(q.to_string(), "1.01");

        let q = validate_quantity("2.5", false).unwrap();
        assert_eq!(q.to_string(), "2.50");
    }

    #[test]
    fn whole_units_truncates() {
        let q = validate_quantity("2.75", false).unwrap();
        assert_eq!(q.whole_units(), dec!(2));
        assert!(!q.is_whole());
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(
            QuantityError::NotNumeric.to_string(),
            "You must specify a positive number for the quantity"
        );
        assert_eq!(
            QuantityError::NotWholeNumber.to_string(),
            "You must specify a whole number for the quantity."
        );
    }

    mod proptest_tests {
        use super::*;
        use core::str::FromStr;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: positive numeric strings validate to their own value.
            #[test]
            fn positive_numbers_round_trip(whole in 0u32..100_000, frac in 0u32..100) {
                prop_assume!(whole > 0 || frac > 0);
                let raw = format!("{whole}.{frac:02}");
                let expected = Decimal::from_str(&raw).unwrap();
                prop_assert_eq!(validate_quantity(&raw, false).unwrap().raw(), expected);
            }

            /// Property: non-positive numbers are rejected as not positive.
            #[test]
            fn non_positive_numbers_rejected(n in -1_000_000i64..=0) {
                prop_assert_eq!(
                    validate_quantity(&n.to_string(), false),
                    Err(QuantityError::NotPositive)
                );
            }

            /// Property: strings with letters are never numeric.
            #[test]
            fn alphabetic_input_rejected(raw in "[a-df-zA-DF-Z][a-zA-Z ]{0,20}") {
                prop_assert_eq!(validate_quantity(&raw, false), Err(QuantityError::NotNumeric));
            }

            /// Property: fractional values fail only when integers are required.
            #[test]
            fn fractional_values_need_decimal_datatype(whole in 0u32..10_000, frac in 1u32..100) {
                let raw = format!("{whole}.{frac:02}");
                prop_assert_eq!(validate_quantity(&raw, true), Err(QuantityError::NotWholeNumber));
                prop_assert!(validate_quantity(&raw, false).is_ok());
            }
        }
    }
}
