use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents** of a peso.
///
/// Use this type for **all** local arithmetic (bill subtotals, counted totals,
/// differences) to avoid floating-point drift. Floats only exist at the wire
/// boundary, see [`Money::from_major`] and [`Money::to_major`].
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::from_pesos(21_500);
/// assert_eq!(amount.cents(), 2_150_000);
/// assert_eq!(amount.to_string(), "$21.500");
/// assert_eq!(Money::new(123_450).to_string(), "$1.234,50");
/// ```
///
/// Parsing from cashier input (`$`, spaces and thousands dots are accepted):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("1500".parse::<Money>().unwrap(), Money::from_pesos(1500));
/// assert_eq!("$ 1.500,50".parse::<Money>().unwrap(), Money::new(150_050));
/// assert!("12,345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new amount from whole pesos.
    #[must_use]
    pub const fn from_pesos(pesos: i64) -> Self {
        Self(pesos.saturating_mul(100))
    }

    /// Converts a wire amount (major units) into cents, rounding half away
    /// from zero. Non-finite values become zero.
    #[must_use]
    pub fn from_major(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self((value * 100.0).round() as i64)
    }

    /// Wire representation in major units.
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Multiplies by a count, saturating at the `i64` bounds.
    #[must_use]
    pub const fn saturating_mul(self, count: i64) -> Self {
        Self(self.0.saturating_mul(count))
    }

    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Renders the amount the way an es-AR register shows it: `$21.500`,
    /// `$1.234,50`, `-$2.000`. Cents are shown only when non-zero.
    #[must_use]
    pub fn format(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}", self.format_abs())
    }

    /// Like [`Money::format`] but without the sign.
    #[must_use]
    pub fn format_abs(self) -> String {
        let abs = self.0.unsigned_abs();
        let pesos = group_thousands(abs / 100);
        let cents = abs % 100;
        if cents == 0 {
            format!("${pesos}")
        } else {
            format!("${pesos},{cents:02}")
        }
    }

    /// Parses a manually typed amount.
    ///
    /// Rules:
    /// - an optional leading `$`, `+` or `-`; spaces are ignored
    /// - with a `,` present, `.` are thousands separators and `,` is decimal
    /// - without `,`, a `.` followed by groups of exactly three digits is a
    ///   thousands separator, otherwise it is the decimal separator
    /// - at most two fraction digits
    pub fn parse_input(s: &str) -> Result<Self, EngineError> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let (negative, rest) = match compact.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, compact.strip_prefix('+').unwrap_or(&compact)),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        if rest.is_empty() {
            return Err(empty());
        }

        let (whole, fraction) = split_decimal(rest).ok_or_else(invalid)?;
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let pesos: i64 = whole.parse().map_err(|_| overflow())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => fraction.parse::<i64>().map_err(|_| invalid())?,
            _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
        };

        let total = pesos
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;
        Ok(Self(if negative { -total } else { total }))
    }
}

/// Splits into whole digits (thousands separators removed) and fraction.
fn split_decimal(raw: &str) -> Option<(String, String)> {
    if let Some((whole, fraction)) = raw.rsplit_once(',') {
        if fraction.contains('.') || whole.contains(',') {
            return None;
        }
        return Some((strip_thousands(whole)?, fraction.to_string()));
    }

    let groups: Vec<&str> = raw.split('.').collect();
    match groups.as_slice() {
        [whole] => Some((whole.to_string(), String::new())),
        [whole, fraction] if fraction.len() != 3 => Some((whole.to_string(), fraction.to_string())),
        _ => Some((strip_thousands(raw)?, String::new())),
    }
}

/// `21.500.000` -> `21500000`; every group after the first must have three
/// digits.
fn strip_thousands(raw: &str) -> Option<String> {
    let mut groups = raw.split('.');
    let mut out = groups.next()?.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Money {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_input(s)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

// Arithmetic saturates at the `i64` bounds; typed input can reach them.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_es_ar() {
        assert_eq!(Money::ZERO.to_string(), "$0");
        assert_eq!(Money::from_pesos(10).to_string(), "$10");
        assert_eq!(Money::from_pesos(21_500).to_string(), "$21.500");
        assert_eq!(Money::from_pesos(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::new(123_450).to_string(), "$1.234,50");
        assert_eq!(Money::new(5).to_string(), "$0,05");
        assert_eq!(Money::from_pesos(-2_000).to_string(), "-$2.000");
        assert_eq!(Money::from_pesos(-2_000).format_abs(), "$2.000");
    }

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(21_500.0), Money::from_pesos(21_500));
        assert_eq!(Money::from_major(0.1 + 0.2), Money::new(30));
        assert_eq!(Money::from_major(-0.005), Money::new(-1));
        assert_eq!(Money::from_major(f64::NAN), Money::ZERO);
        assert_eq!(Money::new(150_050).to_major(), 1500.5);
    }

    #[test]
    fn parse_accepts_common_cashier_input() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::from_pesos(10));
        assert_eq!("10.5".parse::<Money>().unwrap(), Money::new(1050));
        assert_eq!("10,50".parse::<Money>().unwrap(), Money::new(1050));
        assert_eq!("21.500".parse::<Money>().unwrap(), Money::from_pesos(21_500));
        assert_eq!("1.234.567".parse::<Money>().unwrap(), Money::from_pesos(1_234_567));
        assert_eq!("$ 1.500,5".parse::<Money>().unwrap(), Money::new(150_050));
        assert_eq!("-0,01".parse::<Money>().unwrap(), Money::new(-1));
        assert_eq!("  2.30 ".parse::<Money>().unwrap(), Money::new(230));
    }

    #[test]
    fn arithmetic_saturates_at_the_bounds() {
        let top = Money::parse_input("92233720368547758,07").unwrap();
        assert_eq!(top, Money::new(i64::MAX));
        assert_eq!(top - Money::new(-50_000), Money::new(i64::MAX));
        assert_eq!(top + Money::new(1), Money::new(i64::MAX));
        assert_eq!(-Money::new(i64::MIN), Money::new(i64::MAX));

        let mut bottom = Money::new(i64::MIN);
        bottom -= Money::new(1);
        assert_eq!(bottom, Money::new(i64::MIN));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("$".parse::<Money>().is_err());
        assert!("12,345".parse::<Money>().is_err());
        assert!("1.50.0".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1,2,3".parse::<Money>().is_err());
    }
}
