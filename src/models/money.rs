//! Integer money amounts in minor currency units
//!
//! Card amounts travel on the wire as `amountMinorUnits`; keeping them as i64
//! avoids floating-point drift when statements are summed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

/// A monetary amount in the smallest unit of its currency (cents, pence, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Format as `<code> <major>.<minor>` assuming two decimal places
    pub fn format_with_code(&self, currency: &str) -> String {
        format!("{} {}", currency, self)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor_units(1050).to_string(), "10.50");
        assert_eq!(Money::from_minor_units(5).to_string(), "0.05");
        assert_eq!(Money::from_minor_units(-1050).to_string(), "-10.50");
        assert_eq!(
            Money::from_minor_units(250000).format_with_code("EUR"),
            "EUR 2500.00"
        );
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor_units(1000);
        let b = Money::from_minor_units(250);
        assert_eq!((a - b).minor_units(), 750);
        assert_eq!((-a).minor_units(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor_units(), 1500);
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor_units(1999)).unwrap();
        assert_eq!(json, "1999");
        let back: Money = serde_json::from_str("1999").unwrap();
        assert_eq!(back.minor_units(), 1999);
    }
}
