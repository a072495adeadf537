//! Monetary value type.

use serde::{Deserialize, Serialize};

/// Money amount represented in paise to avoid floating point issues.
/// Serializes as the bare paise integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in paise (e.g., 1000 = ₹10.00)
    paise: i64,
}

impl Money {
    /// Creates a new Money amount from paise.
    pub const fn from_paise(paise: i64) -> Self {
        Self { paise }
    }

    /// Creates a new Money amount from a whole-rupee value.
    pub const fn from_rupees(rupees: i64) -> Self {
        Self {
            paise: rupees * 100,
        }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { paise: 0 }
    }

    /// Returns the amount in paise.
    pub fn paise(&self) -> i64 {
        self.paise
    }

    /// Returns the rupee portion (whole number).
    pub fn rupees(&self) -> i64 {
        self.paise / 100
    }

    /// Returns the paise portion (remainder after rupees).
    pub fn paise_part(&self) -> i64 {
        self.paise.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.paise > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.paise < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            paise: self.paise * quantity as i64,
        }
    }

    /// Returns the given percentage of this amount, truncated to whole paise.
    pub fn percent(&self, pct: u32) -> Money {
        Money {
            paise: self.paise * pct as i64 / 100,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.paise < 0 {
            write!(f, "-₹{}.{:02}", self.rupees().abs(), self.paise_part())
        } else {
            write!(f, "₹{}.{:02}", self.rupees(), self.paise_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            paise: self.paise + rhs.paise,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            paise: self.paise - rhs.paise,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.paise += rhs.paise;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.paise -= rhs.paise;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_paise_splits_rupees_and_paise() {
        let money = Money::from_paise(1234);
        assert_eq!(money.paise(), 1234);
        assert_eq!(money.rupees(), 12);
        assert_eq!(money.paise_part(), 34);
    }

    #[test]
    fn from_rupees() {
        let money = Money::from_rupees(50);
        assert_eq!(money.paise(), 5000);
        assert_eq!(money.rupees(), 50);
        assert_eq!(money.paise_part(), 0);
    }

    #[test]
    fn display() {
        assert_eq!(Money::from_paise(1234).to_string(), "₹12.34");
        assert_eq!(Money::from_paise(100).to_string(), "₹1.00");
        assert_eq!(Money::from_paise(5).to_string(), "₹0.05");
        assert_eq!(Money::from_paise(-1234).to_string(), "-₹12.34");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!(a.multiply(3).paise(), 3000);
    }

    #[test]
    fn percent_truncates() {
        assert_eq!(Money::from_paise(1000).percent(10).paise(), 100);
        assert_eq!(Money::from_paise(999).percent(10).paise(), 99);
        assert_eq!(Money::from_paise(1000).percent(0).paise(), 0);
    }

    #[test]
    fn comparison() {
        assert!(Money::from_paise(100).is_positive());
        assert!(Money::from_paise(0).is_zero());
        assert!(Money::from_paise(-100).is_negative());
        assert!(Money::from_rupees(2) > Money::from_rupees(1));
    }

    #[test]
    fn sum() {
        let total: Money = [Money::from_rupees(1), Money::from_rupees(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_rupees(3));
    }
}
