//! Integer price representation.
//!
//! All prices in the system are whole amounts of the display currency (VND
//! has no sub-unit), so `Price` wraps an `i64` and never rounds. Arithmetic
//! saturates rather than wrapping so a malformed snapshot cannot overflow a
//! total.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A price in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(0);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction, clamped at zero.
    ///
    /// Used for discount application: a discount larger than the subtotal
    /// yields zero, never a negative total.
    #[must_use]
    pub const fn saturating_sub_floor(self, other: Self) -> Self {
        let diff = self.0.saturating_sub(other.0);
        if diff < 0 { Self(0) } else { Self(diff) }
    }

    /// Saturating multiplication by a quantity.
    #[must_use]
    pub fn saturating_mul_quantity(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Format for display, e.g. `1.234.567 ₫`.
    ///
    /// Negative amounts only arise from malformed API data but are still
    /// rendered with a leading sign rather than panicking.
    #[must_use]
    pub fn display(&self) -> String {
        let negative = self.0 < 0;
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
        let offset = digits.len() % 3;
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - offset) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if negative {
            format!("-{grouped} ₫")
        } else {
            format!("{grouped} ₫")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grouping() {
        assert_eq!(Price::new(0).display(), "0 ₫");
        assert_eq!(Price::new(500).display(), "500 ₫");
        assert_eq!(Price::new(30_000).display(), "30.000 ₫");
        assert_eq!(Price::new(500_000).display(), "500.000 ₫");
        assert_eq!(Price::new(1_234_567).display(), "1.234.567 ₫");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::new(-30_000).display(), "-30.000 ₫");
    }

    #[test]
    fn test_saturating_sub_floor() {
        assert_eq!(
            Price::new(100).saturating_sub_floor(Price::new(30)),
            Price::new(70)
        );
        assert_eq!(
            Price::new(100).saturating_sub_floor(Price::new(150)),
            Price::ZERO
        );
    }

    #[test]
    fn test_mul_quantity() {
        assert_eq!(
            Price::new(500_000).saturating_mul_quantity(2),
            Price::new(1_000_000)
        );
        assert_eq!(Price::new(i64::MAX).saturating_mul_quantity(2).amount(), i64::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::new(10), Price::new(20), Price::new(30)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(60));
    }

    #[test]
    fn test_serde_transparent() {
        let price = Price::new(550_000);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "550000");

        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }
}
