//! Request and response shapes for the commerce API.
//!
//! Domain entities (`Cart`, `ProductSnapshot`, `ShippingAddress`, ...) come
//! from `curio_core` and deserialize directly off the wire; the types here
//! are the request envelopes and the handful of responses that exist only at
//! the API boundary.

use chrono::{DateTime, Utc};
use curio_core::{
    AddressRef, DiscountType, OrderRef, OrderStatus, PaymentMethod, Price, ProductRef,
    ProductSnapshot, PromotionApplication, ShippingAddress, VariantRef,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog
// =============================================================================

/// One page of catalog products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<ProductSnapshot>,
    /// 1-based page number.
    pub page: u32,
    /// Total number of pages for the query.
    pub total_pages: u32,
}

impl ProductPage {
    /// Whether more pages follow this one.
    #[must_use]
    pub const fn has_more_pages(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Catalog listing query, forwarded to the API as-is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: u32,
    /// Category handle filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text search term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

// =============================================================================
// Cart mutations
// =============================================================================

/// Input for adding a line to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    /// Product to add.
    pub product_id: ProductRef,
    /// Selected variant, required when the product has variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantRef>,
    /// Quantity to add.
    pub quantity: u32,
}

/// Input for setting a line's quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    /// Product whose line is updated.
    pub product_id: ProductRef,
    /// Variant qualifier of the line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantRef>,
    /// New quantity, at least 1.
    pub quantity: u32,
}

// =============================================================================
// Promotions
// =============================================================================

/// Input for validating a discount code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRequest {
    /// The code as entered by the customer.
    pub code: String,
    /// Current order subtotal the code is validated against.
    pub order_total: Price,
}

/// Server response to a successful code validation.
///
/// `discount` is the already-computed deduction; minimum-order and cap rules
/// were enforced server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionGrant {
    /// The validated code.
    pub code: String,
    /// Discount expression type.
    pub discount_type: DiscountType,
    /// Raw discount value (percent points or fixed amount).
    pub discount_value: i64,
    /// Computed deduction amount.
    pub discount: Price,
}

impl PromotionGrant {
    /// Bind the grant to the subtotal it was validated against.
    #[must_use]
    pub fn into_application(self, order_total: Price) -> PromotionApplication {
        PromotionApplication {
            code: self.code,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            discount: self.discount,
            subtotal_at_validation: order_total,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Input for placing an order from the current cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Delivery address.
    pub shipping_address: ShippingAddress,
    /// Selected payment method.
    pub payment_method: PaymentMethod,
    /// Optional customer note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Applied promotion code, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    /// Discount amount from the promotion validation response.
    pub discount: Price,
}

/// Response to a successful order placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// Identifier of the created order.
    pub order_id: OrderRef,
}

/// One order in the account history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order ref.
    pub id: OrderRef,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Grand total charged.
    pub total: Price,
    /// Number of items in the order.
    pub item_count: u32,
}

// =============================================================================
// Auth and account
// =============================================================================

/// Input for the login passthrough.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Customer email.
    pub email: String,
    /// Customer password, forwarded as-is.
    pub password: String,
}

/// Bearer token identifying a customer session against the commerce API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerToken {
    /// Opaque bearer token.
    pub token: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// A saved address in the customer's address book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Address ref.
    pub id: AddressRef,
    /// The address itself.
    #[serde(flatten)]
    pub address: ShippingAddress,
    /// Whether this is the customer's default address.
    #[serde(default)]
    pub is_default: bool,
}

/// Error body the API attaches to non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_binds_subtotal() {
        let grant = PromotionGrant {
            code: "TET10".to_owned(),
            discount_type: DiscountType::Percent,
            discount_value: 10,
            discount: Price::new(100_000),
        };

        let application = grant.into_application(Price::new(1_000_000));
        assert_eq!(application.subtotal_at_validation, Price::new(1_000_000));
        assert!(!application.is_stale(Price::new(1_000_000)));
        assert!(application.is_stale(Price::new(900_000)));
    }

    #[test]
    fn test_add_item_request_omits_empty_variant() {
        let request = AddItemRequest {
            product_id: ProductRef::new("prod_1"),
            variant_id: None,
            quantity: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("variant_id").is_none());
    }

    #[test]
    fn test_product_page_has_more() {
        let page = ProductPage {
            products: Vec::new(),
            page: 2,
            total_pages: 3,
        };
        assert!(page.has_more_pages());

        let last = ProductPage {
            products: Vec::new(),
            page: 3,
            total_pages: 3,
        };
        assert!(!last.has_more_pages());
    }
}
