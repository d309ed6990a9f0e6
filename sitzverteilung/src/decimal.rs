//! Exact arithmetic for the apportionment methods.
//!
//! Every comparison between vote shares and divisors is done on exact
//! rationals. Decimal values only appear at the edges: when reading votes and
//! when publishing a divisor. The rounding applied at that point is always an
//! explicit argument.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::config::ApportionmentError;

// Decimal keeps at most 28 significant digits.
const MAX_SCALE: u32 = 28;
const DIGIT_LIMIT_EXP: u32 = 27;

// Preference order of the digits when choosing a divisor between two bounds.
const NICE_DIGITS: [u32; 10] = [5, 8, 6, 4, 2, 9, 7, 3, 1, 0];

/// An exact rational number of unbounded size.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub(crate) struct Ratio(BigRational);

impl Ratio {
    /// Returns `None` for a zero denominator.
    pub(crate) fn new(num: i128, den: i128) -> Option<Ratio> {
        if den == 0 {
            return None;
        }
        Some(Ratio(BigRational::new(BigInt::from(num), BigInt::from(den))))
    }

    pub(crate) fn zero() -> Ratio {
        Ratio(BigRational::zero())
    }

    pub(crate) fn from_int(n: i128) -> Ratio {
        Ratio(BigRational::from_integer(BigInt::from(n)))
    }

    pub(crate) fn from_decimal(d: Decimal) -> Ratio {
        let den = BigInt::from(10u8).pow(d.scale());
        Ratio(BigRational::new(BigInt::from(d.mantissa()), den))
    }

    pub(crate) fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub(crate) fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub(crate) fn add(&self, other: &Ratio) -> Ratio {
        Ratio(&self.0 + &other.0)
    }

    pub(crate) fn mul(&self, other: &Ratio) -> Ratio {
        Ratio(&self.0 * &other.0)
    }

    pub(crate) fn div(&self, other: &Ratio) -> Option<Ratio> {
        if other.0.is_zero() {
            return None;
        }
        Some(Ratio(&self.0 / &other.0))
    }

    /// Rounds to the nearest integer, halves upwards. `None` if the result
    /// does not fit an `i128`.
    pub(crate) fn round_half_up(&self) -> Option<i128> {
        let half = BigRational::new(BigInt::from(1u8), BigInt::from(2u8));
        (&self.0 + half).floor().to_integer().to_i128()
    }

    /// Converts to a decimal of at most 28 significant digits, rounding the
    /// discarded remainder with the given strategy.
    pub(crate) fn to_decimal(&self, rounding: RoundingStrategy) -> Option<Decimal> {
        let negative = self.0.is_negative();
        let abs = self.0.abs();
        let den = abs.denom();
        let ten = BigInt::from(10u8);
        let limit = ten.pow(DIGIT_LIMIT_EXP);
        let (mut mantissa, mut rem) = abs.numer().div_rem(den);
        let mut scale = 0;
        while !rem.is_zero() && scale < MAX_SCALE && mantissa < limit {
            let (digit, next) = (&rem * &ten).div_rem(den);
            mantissa = mantissa * &ten + digit;
            rem = next;
            scale += 1;
        }
        if !rem.is_zero() {
            let twice = &rem + &rem;
            let away = match rounding {
                RoundingStrategy::ToZero => false,
                RoundingStrategy::AwayFromZero => true,
                RoundingStrategy::ToPositiveInfinity => !negative,
                RoundingStrategy::ToNegativeInfinity => negative,
                RoundingStrategy::MidpointTowardZero => &twice > den,
                RoundingStrategy::MidpointNearestEven => {
                    &twice > den || (&twice == den && mantissa.is_odd())
                }
                _ => &twice >= den,
            };
            if away {
                mantissa += BigInt::from(1u8);
            }
        }
        let mantissa = mantissa.to_i128()?;
        let signed = if negative { -mantissa } else { mantissa };
        Decimal::try_from_i128_with_scale(signed, scale).ok()
    }
}

/// The canonical shortest representation: integral values lose their
/// fractional zeros, other values their trailing zeros.
pub fn normalize(x: Decimal) -> Decimal {
    x.normalize()
}

/// Parses a real number, for bounds that come from configuration or user input.
pub fn parse_number(text: &str) -> Result<Decimal, ApportionmentError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ApportionmentError::NotANumber {
            value: text.to_string(),
        })
}

fn aligned_digits(x: Decimal, int_width: usize, frac_width: usize) -> Vec<char> {
    let text = x.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    format!(
        "{:0>iw$}.{:0<fw$}",
        int_part,
        frac_part,
        iw = int_width,
        fw = frac_width
    )
    .chars()
    .collect()
}

fn digit_widths(x: Decimal) -> (usize, usize) {
    let text = x.to_string();
    match text.split_once('.') {
        Some((i, f)) => (i.len(), f.len()),
        None => (text.len(), 0),
    }
}

/// Picks the "nicest" number between two bounds, the form in which a divisor is published.
///
/// The digits of both bounds are compared from the left. At the first position where
/// they differ, the first digit of the preference order 5, 8, 6, 4, 2, 9, 7, 3, 1, 0
/// that is above the lower digit and not above the upper digit is taken, and all the
/// following digits are dropped. The result is therefore strictly above the smaller
/// bound and never above the larger one.
///
/// ```
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use sitzverteilung::decimal::nicest_between;
///
/// let lower = Decimal::from_str("91.428571").unwrap();
/// let upper = Decimal::from_str("106.666666").unwrap();
/// assert_eq!(nicest_between(lower, upper)?, Decimal::from(100));
/// # Ok::<(), sitzverteilung::ApportionmentError>(())
/// ```
pub fn nicest_between(first: Decimal, second: Decimal) -> Result<Decimal, ApportionmentError> {
    for bound in [first, second] {
        if bound.is_sign_negative() && !bound.is_zero() {
            return Err(ApportionmentError::NotANumber {
                value: bound.to_string(),
            });
        }
    }
    if first == second {
        return Ok(normalize(first));
    }
    let (lower, upper) = if first < second {
        (normalize(first), normalize(second))
    } else {
        (normalize(second), normalize(first))
    };

    let (lower_int, lower_frac) = digit_widths(lower);
    let (upper_int, upper_frac) = digit_widths(upper);
    let int_width = lower_int.max(upper_int);
    let frac_width = lower_frac.max(upper_frac);
    let lower_digits = aligned_digits(lower, int_width, frac_width);
    let upper_digits = aligned_digits(upper, int_width, frac_width);

    let mut result = String::new();
    for (low, high) in lower_digits.iter().zip(upper_digits.iter()) {
        if low == high {
            result.push(*low);
            continue;
        }
        let (low, high) = match (low.to_digit(10), high.to_digit(10)) {
            (Some(l), Some(h)) => (l, h),
            _ => {
                return Err(ApportionmentError::Inconsistent {
                    reason: format!("misaligned bounds {} and {}", lower, upper),
                })
            }
        };
        if let Some(nice) = NICE_DIGITS.iter().find(|d| **d > low && **d <= high) {
            result.push_str(&nice.to_string());
            if !result.contains('.') {
                while result.len() < int_width {
                    result.push('0');
                }
            }
        }
        break;
    }
    let result = result.trim_end_matches('.');
    parse_number(result).map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ratio_rounding() {
        let r = Ratio::new(5, 2).unwrap();
        assert_eq!(r.round_half_up(), Some(3));
        let r = Ratio::new(7, 3).unwrap();
        assert_eq!(r.round_half_up(), Some(2));
        assert_eq!(Ratio::new(-5, 2).unwrap().round_half_up(), Some(-2));
        assert_eq!(Ratio::from_int(4).round_half_up(), Some(4));
    }

    #[test]
    fn ratio_ordering_is_exact() {
        let third = Ratio::new(1, 3).unwrap();
        let approx = Ratio::from_decimal(dec!(0.3333333333));
        assert!(approx < third);
        assert_eq!(Ratio::new(2, 6), Some(third));
        assert!(Ratio::new(1, -3).unwrap() < Ratio::zero());
        assert!(Ratio::new(1, -3).unwrap().is_negative());
        assert_eq!(Ratio::new(1, 0), None);
        assert_eq!(Ratio::from_int(1).div(&Ratio::zero()), None);
    }

    #[test]
    fn long_fractions_stay_exact() {
        let a = Ratio::from_decimal(dec!(0.1234567890123456789012345678));
        let b = Ratio::from_decimal(dec!(0.987654321098765432109876543));
        let c = Ratio::from_decimal(dec!(0.33333333333333333333333333));
        let total = a.add(&b).add(&c);
        let product = a.mul(&b).mul(&c);
        assert!(product < total);
        assert_eq!(
            total.to_decimal(RoundingStrategy::ToZero),
            Some(dec!(1.444444443444444444344444440))
        );
        let quotient = total.div(&Ratio::from_int(7)).unwrap();
        assert_eq!(quotient.mul(&Ratio::from_int(7)), total);
    }

    #[test]
    fn directed_conversion() {
        let two_thirds = Ratio::new(2, 3).unwrap();
        assert_eq!(
            two_thirds.to_decimal(RoundingStrategy::ToZero),
            Some(dec!(0.6666666666666666666666666666))
        );
        assert_eq!(
            two_thirds.to_decimal(RoundingStrategy::AwayFromZero),
            Some(dec!(0.6666666666666666666666666667))
        );
        let big = Ratio::new(640, 7).unwrap();
        assert_eq!(
            big.to_decimal(RoundingStrategy::AwayFromZero),
            Some(dec!(91.42857142857142857142857143))
        );
        assert_eq!(
            Ratio::new(1, 4).unwrap().to_decimal(RoundingStrategy::ToZero),
            Some(dec!(0.25))
        );
    }

    #[test]
    fn normalize_strips_exponent() {
        assert_eq!(normalize(dec!(96.000)).to_string(), "96");
        assert_eq!(normalize(dec!(95.3300)).to_string(), "95.33");
        assert_eq!(normalize(dec!(100)).to_string(), "100");
    }

    #[test]
    fn nicest_between_examples() {
        assert_eq!(nicest_between(dec!(91.43), dec!(106.67)).unwrap(), dec!(100));
        assert_eq!(nicest_between(dec!(95.1), dec!(96.5)).unwrap(), dec!(96));
        assert_eq!(nicest_between(dec!(95.21), dec!(95.3)).unwrap(), dec!(95.3));
        assert_eq!(nicest_between(dec!(9.5), dec!(12)).unwrap(), dec!(10));
        assert_eq!(nicest_between(dec!(0.05), dec!(0.3)).unwrap(), dec!(0.2));
        assert_eq!(nicest_between(dec!(1.5), dec!(3)).unwrap(), dec!(2));
        assert_eq!(
            nicest_between(dec!(66.666666666666666666666666667), dec!(200)).unwrap(),
            dec!(200)
        );
        assert_eq!(nicest_between(dec!(31712.1), dec!(31790.4)).unwrap(), dec!(31750));
    }

    #[test]
    fn nicest_between_equal_and_symmetric() {
        assert_eq!(nicest_between(dec!(42.500), dec!(42.5)).unwrap(), dec!(42.5));
        assert_eq!(
            nicest_between(dec!(42.500), dec!(42.500)).unwrap().to_string(),
            normalize(dec!(42.500)).to_string()
        );
        assert_eq!(
            nicest_between(dec!(106.67), dec!(91.43)).unwrap(),
            nicest_between(dec!(91.43), dec!(106.67)).unwrap()
        );
    }

    #[test]
    fn nicest_between_stays_in_bounds() {
        let pairs = [
            (dec!(87.2), dec!(87.25)),
            (dec!(0.0012), dec!(0.0019)),
            (dec!(19999.5), dec!(20000.5)),
            (dec!(1), dec!(1000)),
        ];
        for (lo, hi) in pairs {
            let nice = nicest_between(lo, hi).unwrap();
            assert!(nice > lo && nice <= hi, "{} not in ({}, {}]", nice, lo, hi);
        }
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(parse_number("abc").is_err());
        assert_eq!(parse_number(" 12.5 ").unwrap(), dec!(12.5));
        assert!(matches!(
            nicest_between(dec!(-1), dec!(3)),
            Err(ApportionmentError::NotANumber { .. })
        ));
    }
}
