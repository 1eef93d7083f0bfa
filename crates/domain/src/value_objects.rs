//! Value objects shared by the catalog and order modules.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an account ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Money amount in the smallest currency unit.
///
/// Serialized as a bare integer. Arithmetic saturates instead of wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new Money amount from minor units.
    pub fn from_minor(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Returns `floor(self * percent / 100)`.
    ///
    /// Only meaningful for non-negative amounts, which is all this is used
    /// with.
    pub fn percent(&self, percent: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(percent) / 100;
        Money(i64::try_from(scaled).unwrap_or(i64::MAX))
    }

    /// Clamps negative amounts to zero.
    pub fn non_negative(self) -> Money {
        Money(self.0.max(0))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
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
    fn test_money_arithmetic() {
        let a = Money::from_minor(500_000);
        let b = Money::from_minor(30_000);

        assert_eq!((a + b).minor(), 530_000);
        assert_eq!((a - b).minor(), 470_000);
        assert_eq!(a.multiply(2).minor(), 1_000_000);
    }

    #[test]
    fn test_money_percent_floors() {
        assert_eq!(Money::from_minor(1_000_000).percent(10).minor(), 100_000);
        assert_eq!(Money::from_minor(999).percent(10).minor(), 99);
        assert_eq!(Money::from_minor(1).percent(50).minor(), 0);
        assert_eq!(Money::from_minor(1_000).percent(0).minor(), 0);
    }

    #[test]
    fn test_money_saturates() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!((max + Money::from_minor(1)).minor(), i64::MAX);
        assert_eq!(max.multiply(3).minor(), i64::MAX);
    }

    #[test]
    fn test_money_non_negative() {
        assert_eq!(Money::from_minor(-5).non_negative(), Money::zero());
        assert_eq!(Money::from_minor(5).non_negative().minor(), 5);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [1, 2, 3].into_iter().map(Money::from_minor).sum();
        assert_eq!(total.minor(), 6);
    }

    #[test]
    fn test_money_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_minor(1_030_000)).unwrap();
        assert_eq!(json, "1030000");
        let back: Money = serde_json::from_str("42").unwrap();
        assert_eq!(back.minor(), 42);
    }
}
