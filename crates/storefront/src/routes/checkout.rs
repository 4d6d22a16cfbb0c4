//! Checkout route handlers.
//!
//! Checkout composes everything this crate owns locally: the pricing engine
//! for totals, the address cascade for the shipping form, and the session's
//! applied promotion. Order placement itself is delegated to the commerce
//! API, which re-checks stock and discount rules authoritatively.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use curio_core::{PaymentMethod, price_cart};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{CommerceError, CustomerToken, PlaceOrderRequest};
use crate::filters;
use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::routes::cart::{
    CartView, clear_applied_promotion, get_applied_promotion, set_applied_promotion,
};
use crate::routes::regions::{AddressForm, RegionOptionView, resolve_shipping_address};
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Promotion code form data.
#[derive(Debug, Deserialize)]
pub struct PromoForm {
    pub code: String,
}

/// Place order form data.
///
/// Region fields carry the refs selected through the cascade; names are
/// resolved server-side against the same lists the dropdowns were built from.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub payment_method: String,
    pub note: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub provinces: Vec<RegionOptionView>,
    pub promo_error: Option<String>,
    pub nonce: String,
}

/// Checkout totals fragment (re-rendered after promo changes).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_totals.html")]
pub struct CheckoutTotalsTemplate {
    pub cart: CartView,
    pub promo_error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form.
///
/// Carts that are empty or still missing a required variant selection are
/// sent back to the cart page instead.
#[instrument(skip(state, session, token, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    crate::middleware::CspNonce(nonce): crate::middleware::CspNonce,
) -> Result<Response> {
    let cart = state.commerce().get_cart(&token).await?;
    if !cart.ready_for_checkout() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let promotion = get_applied_promotion(&session).await;
    let view = CartView::build(&cart, promotion.as_ref(), state.shipping_policy());

    // A fetch failure leaves the dropdown empty; the customer can retry.
    let provinces = match state.commerce().provinces().await {
        Ok(provinces) => provinces.into_iter().map(RegionOptionView::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch provinces: {e}");
            Vec::new()
        }
    };

    Ok(CheckoutTemplate {
        cart: view,
        provinces,
        promo_error: None,
        nonce,
    }
    .into_response())
}

/// Validate a promotion code against the current subtotal (HTMX).
///
/// The server-computed discount is stored in the session bound to the
/// subtotal it was validated against; the totals fragment reflects it
/// immediately.
#[instrument(skip(state, session, token), fields(code = %form.code))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<PromoForm>,
) -> Result<Response> {
    let code = form.code.trim().to_string();
    let cart = state.commerce().get_cart(&token).await?;
    let policy = state.shipping_policy();

    if code.is_empty() {
        let view = CartView::build(&cart, None, policy);
        return Ok(CheckoutTotalsTemplate {
            cart: view,
            promo_error: Some("Enter a promotion code".to_string()),
        }
        .into_response());
    }

    let subtotal = price_cart(&cart, None, policy).subtotal;

    match state.commerce().apply_promotion(&token, &code, subtotal).await {
        Ok(promotion) => {
            set_applied_promotion(&session, &promotion)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

            let view = CartView::build(&cart, Some(&promotion), policy);
            Ok(CheckoutTotalsTemplate {
                cart: view,
                promo_error: None,
            }
            .into_response())
        }
        // An invalid code is inline feedback, not a failed request
        Err(CommerceError::Api { message, .. }) => {
            let view = CartView::build(&cart, None, policy);
            Ok(CheckoutTotalsTemplate {
                cart: view,
                promo_error: Some(message),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Place the order.
#[instrument(skip(state, session, token, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<PlaceOrderForm>,
) -> Result<Response> {
    let cart = state.commerce().get_cart(&token).await?;
    if !cart.ready_for_checkout() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let payment_method: PaymentMethod = form
        .payment_method
        .parse()
        .map_err(AppError::BadRequest)?;

    let shipping_address = resolve_shipping_address(
        &state,
        AddressForm {
            recipient: &form.recipient,
            phone: &form.phone,
            street: &form.street,
            province: &form.province,
            district: &form.district,
            ward: &form.ward,
        },
    )
    .await?;

    let policy = state.shipping_policy();
    let promotion = get_applied_promotion(&session).await;
    let pricing = price_cart(&cart, promotion.as_ref(), policy);

    // A promotion validated against an older subtotal is re-validated now;
    // if the code no longer qualifies, the order proceeds without it.
    let promotion = if pricing.promotion_stale {
        match promotion {
            Some(stale) => {
                match state
                    .commerce()
                    .apply_promotion(&token, &stale.code, pricing.subtotal)
                    .await
                {
                    Ok(fresh) => {
                        set_applied_promotion(&session, &fresh)
                            .await
                            .map_err(|e| AppError::Internal(e.to_string()))?;
                        Some(fresh)
                    }
                    Err(e) => {
                        tracing::warn!(code = %stale.code, "Promotion no longer valid: {e}");
                        clear_applied_promotion(&session)
                            .await
                            .map_err(|e| AppError::Internal(e.to_string()))?;
                        None
                    }
                }
            }
            None => None,
        }
    } else {
        promotion
    };

    let request = PlaceOrderRequest {
        shipping_address,
        payment_method,
        note: form.note.filter(|n| !n.trim().is_empty()),
        promo_code: promotion.as_ref().map(|promo| promo.code.clone()),
        discount: promotion
            .as_ref()
            .map_or(curio_core::Price::ZERO, |promo| promo.discount),
    };

    let order_id = state.commerce().place_order(&token, request).await?;

    // The API cleared the cart; the promotion is spent with it.
    clear_applied_promotion(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Redirect::to(&format!("/orders/{order_id}/confirmation")).into_response())
}

/// Display the order confirmation page.
#[instrument(skip(_token))]
pub async fn confirmation(
    Path(order_id): Path<String>,
    RequireCustomer(_token): RequireCustomer,
) -> impl IntoResponse {
    ConfirmationTemplate { order_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing_matches_form_values() {
        // The form sends the serde snake_case names
        assert!("cod".parse::<PaymentMethod>().is_ok());
        assert!("bank_transfer".parse::<PaymentMethod>().is_ok());
        assert!("credit_card".parse::<PaymentMethod>().is_err());
    }
}
