//! Cart and line item model.
//!
//! The authoritative cart lives in the commerce API. The storefront never
//! edits a local cart in place: every mutation round-trips to the API and
//! the response replaces the local copy wholesale.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductSnapshot;
use crate::types::VariantRef;

/// One entry in a cart or order.
///
/// The commerce API embeds the full product snapshot in each line, so a
/// fetched cart is self-sufficient for pricing and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Snapshot of the referenced product.
    pub product: ProductSnapshot,
    /// Selected variant, if any.
    #[serde(default)]
    pub variant_id: Option<VariantRef>,
    /// Denormalized variant name for display and order history.
    #[serde(default)]
    pub variant_label: Option<String>,
    /// Quantity, at least 1.
    pub quantity: u32,
}

impl LineItem {
    /// Whether this line is missing a required variant selection.
    ///
    /// Such a line still displays and prices at product level, but checkout
    /// must block until the customer picks a variant.
    #[must_use]
    pub const fn requires_variant_selection(&self) -> bool {
        self.product.has_variants && self.variant_id.is_none()
    }
}

/// An ordered collection of line items owned by one customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart lines in insertion order.
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Cart {
    /// Total quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines that are missing a required variant selection.
    pub fn incomplete_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items
            .iter()
            .filter(|item| item.requires_variant_selection())
    }

    /// Whether checkout may proceed.
    #[must_use]
    pub fn ready_for_checkout(&self) -> bool {
        !self.is_empty() && self.incomplete_items().next().is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Price, ProductRef};

    fn product(has_variants: bool) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductRef::new("prod_1"),
            handle: "tin-robot".to_owned(),
            name: "Tin Robot".to_owned(),
            description: String::new(),
            image_url: None,
            price: Price::new(500_000),
            sale_price: None,
            stock: 5,
            has_variants,
            variants: Vec::new(),
        }
    }

    #[test]
    fn test_requires_variant_selection() {
        let complete = LineItem {
            product: product(false),
            variant_id: None,
            variant_label: None,
            quantity: 1,
        };
        assert!(!complete.requires_variant_selection());

        let incomplete = LineItem {
            product: product(true),
            variant_id: None,
            variant_label: None,
            quantity: 1,
        };
        assert!(incomplete.requires_variant_selection());
    }

    #[test]
    fn test_total_quantity() {
        let cart = Cart {
            items: vec![
                LineItem {
                    product: product(false),
                    variant_id: None,
                    variant_label: None,
                    quantity: 2,
                },
                LineItem {
                    product: product(false),
                    variant_id: None,
                    variant_label: None,
                    quantity: 3,
                },
            ],
        };
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_ready_for_checkout() {
        let empty = Cart::default();
        assert!(!empty.ready_for_checkout());

        let blocked = Cart {
            items: vec![LineItem {
                product: product(true),
                variant_id: None,
                variant_label: None,
                quantity: 1,
            }],
        };
        assert!(!blocked.ready_for_checkout());
        assert_eq!(blocked.incomplete_items().count(), 1);

        let ready = Cart {
            items: vec![LineItem {
                product: product(false),
                variant_id: None,
                variant_label: None,
                quantity: 1,
            }],
        };
        assert!(ready.ready_for_checkout());
    }
}
