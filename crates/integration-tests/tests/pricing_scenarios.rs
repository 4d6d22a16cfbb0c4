//! End-to-end pricing scenarios: carts are mutated through the real client
//! against the stub commerce API, then priced with the engine exactly as the
//! cart and checkout views do.

#![allow(clippy::unwrap_used)]

use curio_core::{Price, ProductRef, ShippingPolicy, VariantRef, price_cart};
use curio_integration_tests::StubCommerce;
use curio_storefront::commerce::{AddItemRequest, UpdateQuantityRequest};

fn add(product: &str, variant: Option<&str>, quantity: u32) -> AddItemRequest {
    AddItemRequest {
        product_id: ProductRef::new(product),
        variant_id: variant.map(VariantRef::new),
        quantity,
    }
}

// One item below the free-shipping threshold pays the flat fee.
#[tokio::test]
async fn single_item_pays_flat_shipping() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client.add_to_cart(&token, add("prod_1", None, 1)).await.unwrap();
    let pricing = price_cart(&cart, None, &ShippingPolicy::default());

    assert_eq!(pricing.subtotal, Price::new(500_000));
    assert_eq!(pricing.shipping_fee, Price::new(30_000));
    assert_eq!(pricing.grand_total, Price::new(530_000));
}

// Raising the quantity to two waives the fee.
#[tokio::test]
async fn two_items_ship_free() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    client.add_to_cart(&token, add("prod_1", None, 1)).await.unwrap();
    let cart = client
        .update_quantity(
            &token,
            UpdateQuantityRequest {
                product_id: ProductRef::new("prod_1"),
                variant_id: None,
                quantity: 2,
            },
        )
        .await
        .unwrap();

    let pricing = price_cart(&cart, None, &ShippingPolicy::default());

    assert_eq!(pricing.subtotal, Price::new(1_000_000));
    assert_eq!(pricing.shipping_fee, Price::ZERO);
    assert!(pricing.free_shipping_applied);
    assert_eq!(pricing.grand_total, Price::new(1_000_000));
}

// A selected variant with a sale price is charged at that sale price.
#[tokio::test]
async fn variant_sale_price_is_effective() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client
        .add_to_cart(&token, add("prod_2", Some("var_a"), 1))
        .await
        .unwrap();
    let pricing = price_cart(&cart, None, &ShippingPolicy::default());

    assert_eq!(pricing.lines.first().unwrap().unit_price, Price::new(550_000));
    assert_eq!(pricing.subtotal, Price::new(550_000));
    assert_eq!(pricing.grand_total, Price::new(580_000));

    // The server denormalized the variant name onto the line
    assert_eq!(
        cart.items.first().unwrap().variant_label.as_deref(),
        Some("A3 framed")
    );
}

// A server-validated percent discount composes with free shipping.
#[tokio::test]
async fn percent_discount_composes_with_free_shipping() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client.add_to_cart(&token, add("prod_1", None, 2)).await.unwrap();
    let policy = ShippingPolicy::default();
    let subtotal = price_cart(&cart, None, &policy).subtotal;

    let promotion = client
        .apply_promotion(&token, "TET10", subtotal)
        .await
        .unwrap();
    assert_eq!(promotion.discount, Price::new(100_000));

    let pricing = price_cart(&cart, Some(&promotion), &policy);
    assert!(!pricing.promotion_stale);
    assert_eq!(pricing.grand_total, Price::new(900_000));
}

// A line whose variant ref no longer resolves prices at product level
// instead of failing.
#[tokio::test]
async fn dangling_variant_ref_falls_back_to_product_price() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client
        .add_to_cart(&token, add("prod_2", Some("var_retired"), 1))
        .await
        .unwrap();
    let pricing = price_cart(&cart, None, &ShippingPolicy::default());

    assert_eq!(pricing.lines.first().unwrap().unit_price, Price::new(500_000));
}

// An oversized fixed discount zeroes the merchandise value but the flat
// shipping fee survives the clamp.
#[tokio::test]
async fn oversized_discount_clamps_at_zero() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client.add_to_cart(&token, add("prod_3", None, 1)).await.unwrap();
    let policy = ShippingPolicy::default();
    let subtotal = price_cart(&cart, None, &policy).subtotal;
    assert_eq!(subtotal, Price::new(100_000));

    let promotion = client
        .apply_promotion(&token, "GIAM200K", subtotal)
        .await
        .unwrap();
    assert_eq!(promotion.discount, Price::new(200_000));

    let pricing = price_cart(&cart, Some(&promotion), &policy);
    assert_eq!(pricing.grand_total, Price::new(30_000));
}

// Editing the cart after a promotion was applied flags the application as
// stale so checkout re-validates it.
#[tokio::test]
async fn cart_edit_after_promotion_is_flagged_stale() {
    let backend = StubCommerce::spawn().await;
    let client = backend.client();
    let token = StubCommerce::token();

    let cart = client.add_to_cart(&token, add("prod_1", None, 2)).await.unwrap();
    let policy = ShippingPolicy::default();
    let subtotal = price_cart(&cart, None, &policy).subtotal;
    let promotion = client
        .apply_promotion(&token, "TET10", subtotal)
        .await
        .unwrap();

    let cart = client
        .update_quantity(
            &token,
            UpdateQuantityRequest {
                product_id: ProductRef::new("prod_1"),
                variant_id: None,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let pricing = price_cart(&cart, Some(&promotion), &policy);
    assert!(pricing.promotion_stale);
}
