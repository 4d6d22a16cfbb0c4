//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The commerce API owns the cart; every mutation here sends the change and
//! rebuilds the view from the full cart returned in the response. Local state
//! is never patched in place.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use curio_core::{
    Cart, PricingResult, ProductRef, PromotionApplication, ShippingPolicy, VariantRef, price_cart,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{AddItemRequest, CustomerToken, UpdateQuantityRequest};
use crate::filters;
use crate::middleware::{OptionalCustomer, RequireCustomer};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub handle: String,
    pub title: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub in_stock: bool,
    pub needs_variant: bool,
    pub image_url: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping_fee: String,
    pub free_shipping: bool,
    pub promo_code: Option<String>,
    pub discount: Option<String>,
    pub promo_stale: bool,
    pub total: String,
    pub ready_for_checkout: bool,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: curio_core::Price::ZERO.display(),
            shipping_fee: curio_core::Price::ZERO.display(),
            free_shipping: false,
            promo_code: None,
            discount: None,
            promo_stale: false,
            total: curio_core::Price::ZERO.display(),
            ready_for_checkout: false,
        }
    }

    /// Build the view by running the pricing engine over a fetched cart.
    #[must_use]
    pub fn build(
        cart: &Cart,
        promotion: Option<&PromotionApplication>,
        policy: &ShippingPolicy,
    ) -> Self {
        if cart.is_empty() {
            return Self::empty();
        }

        let pricing = price_cart(cart, promotion, policy);
        Self::from_pricing(cart, promotion, &pricing)
    }

    fn from_pricing(
        cart: &Cart,
        promotion: Option<&PromotionApplication>,
        pricing: &PricingResult,
    ) -> Self {
        let items = cart
            .items
            .iter()
            .zip(&pricing.lines)
            .map(|(item, line)| CartItemView {
                product_id: item.product.id.to_string(),
                variant_id: item.variant_id.as_ref().map(ToString::to_string),
                handle: item.product.handle.clone(),
                title: item.product.name.clone(),
                variant_label: item.variant_label.clone(),
                quantity: item.quantity,
                unit_price: line.unit_price.display(),
                line_total: line.line_total.display(),
                in_stock: line.in_stock,
                needs_variant: line.requires_variant_selection,
                image_url: item.product.image_url.clone(),
            })
            .collect();

        Self {
            items,
            item_count: pricing.total_quantity,
            subtotal: pricing.subtotal.display(),
            shipping_fee: pricing.shipping_fee.display(),
            free_shipping: pricing.free_shipping_applied,
            promo_code: promotion.map(|promo| promo.code.clone()),
            discount: promotion.map(|_| pricing.discount.display()),
            promo_stale: pricing.promotion_stale,
            total: pricing.grand_total.display(),
            ready_for_checkout: cart.ready_for_checkout(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the promotion applied earlier in this session, if any.
pub async fn get_applied_promotion(session: &Session) -> Option<PromotionApplication> {
    session
        .get::<PromotionApplication>(session_keys::APPLIED_PROMOTION)
        .await
        .ok()
        .flatten()
}

/// Store the applied promotion in the session.
pub async fn set_applied_promotion(
    session: &Session,
    promotion: &PromotionApplication,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::APPLIED_PROMOTION, promotion)
        .await
}

/// Drop the applied promotion from the session.
pub async fn clear_applied_promotion(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<PromotionApplication>(session_keys::APPLIED_PROMOTION)
        .await?;
    Ok(())
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Fetch the cart and build its view, degrading to empty on failure.
async fn fetch_cart_view(state: &AppState, session: &Session, token: &CustomerToken) -> CartView {
    match state.commerce().get_cart(token).await {
        Ok(cart) => {
            let promotion = get_applied_promotion(session).await;
            CartView::build(&cart, promotion.as_ref(), state.shipping_policy())
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            CartView::empty()
        }
    }
}

/// Display cart page.
#[instrument(skip(state, session, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
) -> impl IntoResponse {
    let cart = fetch_cart_view(&state, &session, &token).await;

    CartShowTemplate { cart }
}

/// Add item to cart (HTMX).
///
/// Returns the updated count badge plus an HTMX trigger so other fragments
/// can refresh themselves from the server.
#[instrument(skip(state, token))]
pub async fn add(
    State(state): State<AppState>,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let request = AddItemRequest {
        product_id: ProductRef::new(form.product_id),
        variant_id: form.variant_id.filter(|v| !v.is_empty()).map(VariantRef::new),
        quantity: form.quantity.unwrap_or(1).max(1),
    };

    match state.commerce().add_to_cart(&token, request).await {
        Ok(cart) => {
            let count = cart.total_quantity();
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate { count },
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<span class=\"form-error\">Error adding to cart</span>"),
            )
                .into_response()
        }
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, token))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let request = UpdateQuantityRequest {
        product_id: ProductRef::new(form.product_id),
        variant_id: form.variant_id.filter(|v| !v.is_empty()).map(VariantRef::new),
        quantity: form.quantity.max(1),
    };

    match state.commerce().update_quantity(&token, request).await {
        Ok(cart) => rerender_items(&state, &session, &cart).await,
        Err(e) => {
            tracing::error!("Failed to update cart: {e}");
            CartItemsTemplate {
                cart: CartView::empty(),
            }
            .into_response()
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, token))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let product_id = ProductRef::new(form.product_id);
    let variant_id = form.variant_id.filter(|v| !v.is_empty()).map(VariantRef::new);

    match state
        .commerce()
        .remove_from_cart(&token, &product_id, variant_id.as_ref())
        .await
    {
        Ok(cart) => rerender_items(&state, &session, &cart).await,
        Err(e) => {
            tracing::error!("Failed to remove from cart: {e}");
            CartItemsTemplate {
                cart: CartView::empty(),
            }
            .into_response()
        }
    }
}

/// Clear the whole cart (HTMX).
#[instrument(skip(state, session, token))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
) -> Response {
    match state.commerce().clear_cart(&token).await {
        Ok(cart) => {
            // An emptied cart invalidates any applied promotion outright.
            if let Err(e) = clear_applied_promotion(&session).await {
                tracing::error!("Failed to clear applied promotion: {e}");
            }
            rerender_items(&state, &session, &cart).await
        }
        Err(e) => {
            tracing::error!("Failed to clear cart: {e}");
            CartItemsTemplate {
                cart: CartView::empty(),
            }
            .into_response()
        }
    }
}

/// Get cart count badge (HTMX).
///
/// Rendered on every page, so guests simply see an empty badge.
#[instrument(skip(state, token))]
pub async fn count(
    State(state): State<AppState>,
    OptionalCustomer(token): OptionalCustomer,
) -> impl IntoResponse {
    let count = match token {
        Some(token) => state
            .commerce()
            .get_cart(&token)
            .await
            .map(|cart| cart.total_quantity())
            .unwrap_or(0),
        None => 0,
    };

    CartCountTemplate { count }
}

/// Render the items fragment from the cart the server just returned.
async fn rerender_items(state: &AppState, session: &Session, cart: &Cart) -> Response {
    let promotion = get_applied_promotion(session).await;
    let view = CartView::build(cart, promotion.as_ref(), state.shipping_policy());
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart: view },
    )
        .into_response()
}
