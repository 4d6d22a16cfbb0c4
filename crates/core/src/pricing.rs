//! Cart pricing computation.
//!
//! Pure, synchronous mapping from a fetched cart (plus an optional applied
//! promotion) to per-line effective prices, subtotal, shipping fee, and grand
//! total. Performs no I/O and raises no errors: inconsistent input (a line
//! referencing a variant the snapshot no longer lists) degrades to
//! product-level pricing instead of failing.

use serde::Serialize;

use crate::cart::{Cart, LineItem};
use crate::catalog::Variant;
use crate::promotion::PromotionApplication;
use crate::types::Price;

/// Shipping fee rule: a flat fee waived once the cart holds enough items.
///
/// The threshold is on total item quantity, not on subtotal value. Two units
/// of the cheapest product in the catalog ship free; one unit of the most
/// expensive does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingPolicy {
    /// Fee charged below the threshold.
    pub flat_fee: Price,
    /// Minimum total quantity for free shipping.
    pub free_item_threshold: u32,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            flat_fee: Price::new(30_000),
            free_item_threshold: 2,
        }
    }
}

impl ShippingPolicy {
    /// Fee for a cart with the given total quantity.
    #[must_use]
    pub fn fee_for_quantity(&self, total_quantity: u32) -> Price {
        if total_quantity >= self.free_item_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        }
    }
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    /// Effective unit price after sale/variant resolution.
    pub unit_price: Price,
    /// `unit_price` times quantity.
    pub line_total: Price,
    /// Quantity copied from the line item.
    pub quantity: u32,
    /// Whether effective stock covers the requested quantity.
    pub in_stock: bool,
    /// Whether the line is blocked on a variant selection.
    pub requires_variant_selection: bool,
}

/// Output of [`price_cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingResult {
    /// Priced lines, in cart order.
    pub lines: Vec<PricedLine>,
    /// Total quantity across all lines.
    pub total_quantity: u32,
    /// Sum of line totals before discount and shipping.
    pub subtotal: Price,
    /// Shipping fee under the policy's quantity threshold.
    pub shipping_fee: Price,
    /// Whether the quantity threshold waived the fee.
    pub free_shipping_applied: bool,
    /// Server-computed discount carried over from the applied promotion.
    pub discount: Price,
    /// True when the applied promotion was validated against a different
    /// subtotal than the current one and must be re-validated before use.
    pub promotion_stale: bool,
    /// `max(0, subtotal - discount) + shipping_fee`.
    pub grand_total: Price,
}

/// Resolve the effective unit price of a line item.
///
/// Resolution order: variant sale price, variant base price, product sale
/// price, product base price. A price counts only when present and nonzero;
/// the reference data uses zero to mean "unset", and the storefront must
/// never charge or display a zero price. A `variant_id` that no longer
/// resolves in the snapshot falls back to product-level pricing.
#[must_use]
pub fn effective_unit_price(item: &LineItem) -> Price {
    let variant = item
        .variant_id
        .as_ref()
        .and_then(|id| item.product.variant(id));

    variant
        .and_then(variant_price)
        .or_else(|| nonzero(item.product.sale_price))
        .unwrap_or(item.product.price)
}

/// Resolve the effective available stock of a line item.
///
/// Variant stock applies when a variant is selected and carries its own
/// count; otherwise the product-level stock applies. Used for display and
/// checkout blocking only, never for pricing.
#[must_use]
pub fn effective_stock(item: &LineItem) -> i64 {
    item.variant_id
        .as_ref()
        .and_then(|id| item.product.variant(id))
        .and_then(|variant| variant.stock)
        .unwrap_or(item.product.stock)
}

fn variant_price(variant: &Variant) -> Option<Price> {
    nonzero(variant.sale_price).or_else(|| nonzero(variant.price))
}

fn nonzero(price: Option<Price>) -> Option<Price> {
    price.filter(Price::is_positive)
}

/// Price a cart.
///
/// The engine only composes arithmetic: the `discount` inside `promotion` is
/// the server-validated amount and is never recomputed locally. When the
/// current subtotal no longer matches the subtotal the promotion was
/// validated against, the result is flagged stale and the caller is expected
/// to re-validate the code before relying on the discount.
///
/// The grand total is clamped so an oversized discount can zero the
/// merchandise value but never produce a negative total; the shipping fee is
/// added after the clamp and remains payable.
#[must_use]
pub fn price_cart(
    cart: &Cart,
    promotion: Option<&PromotionApplication>,
    policy: &ShippingPolicy,
) -> PricingResult {
    let lines: Vec<PricedLine> = cart
        .items
        .iter()
        .map(|item| {
            let unit_price = effective_unit_price(item);
            PricedLine {
                unit_price,
                line_total: unit_price.saturating_mul_quantity(item.quantity),
                quantity: item.quantity,
                in_stock: effective_stock(item) >= i64::from(item.quantity),
                requires_variant_selection: item.requires_variant_selection(),
            }
        })
        .collect();

    let subtotal: Price = lines.iter().map(|line| line.line_total).sum();
    let total_quantity = cart.total_quantity();

    let shipping_fee = policy.fee_for_quantity(total_quantity);
    let free_shipping_applied = !cart.is_empty() && shipping_fee == Price::ZERO;

    let discount = promotion.map_or(Price::ZERO, |promo| promo.discount);
    let promotion_stale = promotion.is_some_and(|promo| promo.is_stale(subtotal));

    let grand_total = subtotal
        .saturating_sub_floor(discount)
        .saturating_add(shipping_fee);

    PricingResult {
        lines,
        total_quantity,
        subtotal,
        shipping_fee,
        free_shipping_applied,
        discount,
        promotion_stale,
        grand_total,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::ProductSnapshot;
    use crate::promotion::DiscountType;
    use crate::types::{ProductRef, VariantRef};

    fn product(price: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductRef::new("prod_1"),
            handle: "tin-robot".to_owned(),
            name: "Tin Robot".to_owned(),
            description: String::new(),
            image_url: None,
            price: Price::new(price),
            sale_price: None,
            stock: 10,
            has_variants: false,
            variants: Vec::new(),
        }
    }

    fn line(product: ProductSnapshot, quantity: u32) -> LineItem {
        LineItem {
            product,
            variant_id: None,
            variant_label: None,
            quantity,
        }
    }

    fn variant(id: &str, price: Option<i64>, sale_price: Option<i64>, stock: Option<i64>) -> Variant {
        Variant {
            id: VariantRef::new(id),
            name: id.to_owned(),
            price: price.map(Price::new),
            sale_price: sale_price.map(Price::new),
            stock,
            is_active: true,
        }
    }

    fn percent_promo(discount: i64, subtotal: i64) -> PromotionApplication {
        PromotionApplication {
            code: "TET10".to_owned(),
            discount_type: DiscountType::Percent,
            discount_value: 10,
            discount: Price::new(discount),
            subtotal_at_validation: Price::new(subtotal),
        }
    }

    // Scenario A: one item, quantity 1, no sale, no promo.
    #[test]
    fn test_single_item_pays_shipping() {
        let cart = Cart {
            items: vec![line(product(500_000), 1)],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());

        assert_eq!(result.subtotal, Price::new(500_000));
        assert_eq!(result.shipping_fee, Price::new(30_000));
        assert!(!result.free_shipping_applied);
        assert_eq!(result.grand_total, Price::new(530_000));
    }

    // Scenario B: same item, quantity 2 waives the fee.
    #[test]
    fn test_two_items_ship_free() {
        let cart = Cart {
            items: vec![line(product(500_000), 2)],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());

        assert_eq!(result.subtotal, Price::new(1_000_000));
        assert_eq!(result.shipping_fee, Price::ZERO);
        assert!(result.free_shipping_applied);
        assert_eq!(result.grand_total, Price::new(1_000_000));
    }

    // The threshold counts items across lines, not per line.
    #[test]
    fn test_threshold_spans_lines() {
        let cart = Cart {
            items: vec![line(product(100_000), 1), line(product(200_000), 1)],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());

        assert_eq!(result.total_quantity, 2);
        assert_eq!(result.shipping_fee, Price::ZERO);
    }

    // Scenario C: variant sale price wins over variant and product base price.
    #[test]
    fn test_variant_sale_price_wins() {
        let mut snapshot = product(500_000);
        snapshot.has_variants = true;
        snapshot.variants = vec![variant("var_1", Some(600_000), Some(550_000), Some(5))];

        let cart = Cart {
            items: vec![LineItem {
                product: snapshot,
                variant_id: Some(VariantRef::new("var_1")),
                variant_label: Some("var_1".to_owned()),
                quantity: 1,
            }],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());

        assert_eq!(result.lines.first().unwrap().unit_price, Price::new(550_000));
        assert_eq!(result.subtotal, Price::new(550_000));
        assert_eq!(result.grand_total, Price::new(580_000));
    }

    // Variant with only a base price: sale falls through to it.
    #[test]
    fn test_variant_base_price_fallback() {
        let mut snapshot = product(500_000);
        snapshot.has_variants = true;
        snapshot.variants = vec![variant("var_1", Some(600_000), None, None)];

        let cart = Cart {
            items: vec![LineItem {
                product: snapshot,
                variant_id: Some(VariantRef::new("var_1")),
                variant_label: None,
                quantity: 1,
            }],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());
        assert_eq!(result.lines.first().unwrap().unit_price, Price::new(600_000));
    }

    // Variant with no price of its own: product sale price applies.
    #[test]
    fn test_bare_variant_uses_product_sale() {
        let mut snapshot = product(500_000);
        snapshot.sale_price = Some(Price::new(450_000));
        snapshot.has_variants = true;
        snapshot.variants = vec![variant("var_1", None, None, Some(2))];

        let cart = Cart {
            items: vec![LineItem {
                product: snapshot,
                variant_id: Some(VariantRef::new("var_1")),
                variant_label: None,
                quantity: 1,
            }],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());
        assert_eq!(result.lines.first().unwrap().unit_price, Price::new(450_000));
    }

    // Scenario E: dangling variant ref degrades to product pricing.
    #[test]
    fn test_missing_variant_falls_back() {
        let mut snapshot = product(500_000);
        snapshot.sale_price = Some(Price::new(480_000));
        snapshot.has_variants = true;
        snapshot.variants = vec![variant("var_1", Some(600_000), None, None)];

        let cart = Cart {
            items: vec![LineItem {
                product: snapshot,
                variant_id: Some(VariantRef::new("var_deleted")),
                variant_label: None,
                quantity: 1,
            }],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());
        assert_eq!(result.lines.first().unwrap().unit_price, Price::new(480_000));
    }

    // A zero sale price means "unset", not "free".
    #[test]
    fn test_zero_sale_price_is_unset() {
        let mut snapshot = product(500_000);
        snapshot.sale_price = Some(Price::ZERO);

        let cart = Cart {
            items: vec![line(snapshot, 1)],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());
        assert_eq!(result.lines.first().unwrap().unit_price, Price::new(500_000));
    }

    // Scenario D: server-reported discount composes with free shipping.
    #[test]
    fn test_discount_composition() {
        let cart = Cart {
            items: vec![line(product(500_000), 2)],
        };
        let promo = percent_promo(100_000, 1_000_000);
        let result = price_cart(&cart, Some(&promo), &ShippingPolicy::default());

        assert_eq!(result.discount, Price::new(100_000));
        assert!(!result.promotion_stale);
        assert_eq!(result.grand_total, Price::new(900_000));
    }

    // Oversized discount clamps the merchandise value at zero; the shipping
    // fee is still charged.
    #[test]
    fn test_discount_never_goes_negative() {
        let cart = Cart {
            items: vec![line(product(100_000), 1)],
        };
        let mut promo = percent_promo(250_000, 100_000);
        promo.discount_type = DiscountType::Fixed;
        let result = price_cart(&cart, Some(&promo), &ShippingPolicy::default());

        assert_eq!(result.grand_total, Price::new(30_000));
    }

    // A promotion validated against a different subtotal is flagged.
    #[test]
    fn test_stale_promotion_flagged() {
        let cart = Cart {
            items: vec![line(product(500_000), 1)],
        };
        let promo = percent_promo(100_000, 1_000_000);
        let result = price_cart(&cart, Some(&promo), &ShippingPolicy::default());

        assert!(result.promotion_stale);
        // The discount still composes; acting on it is the caller's call.
        assert_eq!(result.discount, Price::new(100_000));
    }

    #[test]
    fn test_effective_stock_resolution() {
        let mut snapshot = product(500_000);
        snapshot.stock = 7;
        snapshot.has_variants = true;
        snapshot.variants = vec![
            variant("var_counted", Some(600_000), None, Some(1)),
            variant("var_uncounted", Some(600_000), None, None),
        ];

        let counted = LineItem {
            product: snapshot.clone(),
            variant_id: Some(VariantRef::new("var_counted")),
            variant_label: None,
            quantity: 2,
        };
        assert_eq!(effective_stock(&counted), 1);

        let uncounted = LineItem {
            product: snapshot.clone(),
            variant_id: Some(VariantRef::new("var_uncounted")),
            variant_label: None,
            quantity: 2,
        };
        assert_eq!(effective_stock(&uncounted), 7);

        let no_variant = LineItem {
            product: snapshot,
            variant_id: None,
            variant_label: None,
            quantity: 2,
        };
        assert_eq!(effective_stock(&no_variant), 7);
    }

    #[test]
    fn test_stock_flag_on_lines() {
        let cart = Cart {
            items: vec![line(
                ProductSnapshot {
                    stock: 1,
                    ..product(500_000)
                },
                2,
            )],
        };
        let result = price_cart(&cart, None, &ShippingPolicy::default());
        assert!(!result.lines.first().unwrap().in_stock);
    }

    // Pure function: identical inputs produce identical output.
    #[test]
    fn test_idempotent() {
        let cart = Cart {
            items: vec![line(product(123_456), 3)],
        };
        let promo = percent_promo(12_345, 370_368);
        let policy = ShippingPolicy::default();

        let first = price_cart(&cart, Some(&promo), &policy);
        let second = price_cart(&cart, Some(&promo), &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_cart() {
        let result = price_cart(&Cart::default(), None, &ShippingPolicy::default());
        assert_eq!(result.subtotal, Price::ZERO);
        assert_eq!(result.shipping_fee, Price::new(30_000));
        assert!(!result.free_shipping_applied);
        assert_eq!(result.grand_total, Price::new(30_000));
    }
}
