//! Applied discount codes.
//!
//! Discount rule evaluation (minimum order, caps, expiry) happens in the
//! commerce API. The storefront treats the reported `discount` amount as
//! opaque and trusted; its only local responsibility is detecting when the
//! amount has gone stale because the cart changed after validation.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// How a discount value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the order subtotal.
    Percent,
    /// `discount_value` is a fixed currency amount.
    Fixed,
}

/// The result of validating a discount code against an order subtotal.
///
/// Valid only for the subtotal it was computed against. Once the cart
/// changes, the application is stale and must be re-validated before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionApplication {
    /// The discount code as entered.
    pub code: String,
    /// Discount expression type.
    pub discount_type: DiscountType,
    /// Raw discount value (percent points or fixed amount).
    pub discount_value: i64,
    /// Server-computed deduction amount.
    pub discount: Price,
    /// The subtotal this application was validated against.
    pub subtotal_at_validation: Price,
}

impl PromotionApplication {
    /// Whether the cart subtotal has changed since validation.
    #[must_use]
    pub fn is_stale(&self, current_subtotal: Price) -> bool {
        self.subtotal_at_validation != current_subtotal
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness() {
        let promo = PromotionApplication {
            code: "TET10".to_owned(),
            discount_type: DiscountType::Percent,
            discount_value: 10,
            discount: Price::new(100_000),
            subtotal_at_validation: Price::new(1_000_000),
        };

        assert!(!promo.is_stale(Price::new(1_000_000)));
        assert!(promo.is_stale(Price::new(500_000)));
    }

    #[test]
    fn test_serde() {
        let json = r#"{
            "code": "GIAM50K",
            "discount_type": "fixed",
            "discount_value": 50000,
            "discount": 50000,
            "subtotal_at_validation": 700000
        }"#;
        let promo: PromotionApplication = serde_json::from_str(json).unwrap();
        assert_eq!(promo.discount_type, DiscountType::Fixed);
        assert_eq!(promo.discount, Price::new(50_000));
    }
}
