//! Read-only catalog projections.
//!
//! These types mirror what the commerce API returns for a product at the
//! moment a cart or page was fetched. They are used only for display and
//! pricing; the storefront never mutates catalog state.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductRef, VariantRef};

/// A sub-SKU of a product with its own price and stock.
///
/// Variants are allowed to be partially specified: a variant with no price
/// of its own falls back to product-level pricing (see [`crate::pricing`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant ref.
    pub id: VariantRef,
    /// Display name, e.g. "Bạc xước / Hộp thiếc".
    pub name: String,
    /// Unit price override.
    #[serde(default)]
    pub price: Option<Price>,
    /// Promotional unit price override.
    #[serde(default)]
    pub sale_price: Option<Price>,
    /// Stock override.
    #[serde(default)]
    pub stock: Option<i64>,
    /// Whether the variant can currently be selected.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Read-only projection of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product ref.
    pub id: ProductRef,
    /// URL handle.
    pub handle: String,
    /// Display name.
    pub name: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Base unit price.
    pub price: Price,
    /// Promotional unit price; effective when present and nonzero.
    #[serde(default)]
    pub sale_price: Option<Price>,
    /// Available quantity.
    #[serde(default)]
    pub stock: i64,
    /// Whether this product requires a variant selection before purchase.
    #[serde(default)]
    pub has_variants: bool,
    /// Ordered variant list; empty when `has_variants` is false.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl ProductSnapshot {
    /// Look up a variant by ref.
    ///
    /// Returns `None` when the ref does not appear in the snapshot, which
    /// callers treat as "fall back to product-level pricing" rather than an
    /// error.
    #[must_use]
    pub fn variant(&self, id: &VariantRef) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Whether the product is on sale at product level.
    ///
    /// A zero sale price is treated as unset.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.sale_price
            .is_some_and(|sale| sale.is_positive() && sale < self.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductRef::new("prod_1"),
            handle: "tin-robot".to_owned(),
            name: "Tin Robot".to_owned(),
            description: String::new(),
            image_url: None,
            price: Price::new(500_000),
            sale_price: None,
            stock: 3,
            has_variants: true,
            variants: vec![Variant {
                id: VariantRef::new("var_1"),
                name: "Red".to_owned(),
                price: Some(Price::new(600_000)),
                sale_price: None,
                stock: Some(1),
                is_active: true,
            }],
        }
    }

    #[test]
    fn test_variant_lookup() {
        let product = snapshot();
        assert!(product.variant(&VariantRef::new("var_1")).is_some());
        assert!(product.variant(&VariantRef::new("var_missing")).is_none());
    }

    #[test]
    fn test_on_sale_ignores_zero() {
        let mut product = snapshot();
        assert!(!product.on_sale());

        product.sale_price = Some(Price::ZERO);
        assert!(!product.on_sale());

        product.sale_price = Some(Price::new(450_000));
        assert!(product.on_sale());
    }

    #[test]
    fn test_deserialize_defaults() {
        let product: ProductSnapshot = serde_json::from_str(
            r#"{"id":"prod_2","handle":"enamel-pin","name":"Enamel Pin","price":120000}"#,
        )
        .unwrap();
        assert_eq!(product.stock, 0);
        assert!(!product.has_variants);
        assert!(product.variants.is_empty());

        let variant: Variant =
            serde_json::from_str(r#"{"id":"var_9","name":"Default"}"#).unwrap();
        assert!(variant.is_active);
        assert!(variant.price.is_none());
    }
}
