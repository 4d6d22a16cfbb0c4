//! Account route handlers.
//!
//! Overview, order history, and the address book. Address entry reuses the
//! same province/district/ward cascade as checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{AddressBookEntry, OrderSummary};
use crate::filters;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{CurrentCustomer, session_keys};
use crate::routes::regions::{AddressForm, RegionOptionView, resolve_shipping_address};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Order display data for the history table.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub placed_on: String,
    pub status: &'static str,
    pub total: String,
    pub item_count: u32,
}

impl From<&OrderSummary> for OrderView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.to_string(),
            placed_on: order.created_at.format("%d/%m/%Y").to_string(),
            status: order.status.label(),
            total: order.total.display(),
            item_count: order.item_count,
        }
    }
}

/// Saved address display data.
#[derive(Clone)]
pub struct AddressView {
    pub recipient: String,
    pub phone: String,
    pub line: String,
    pub is_default: bool,
}

impl From<&AddressBookEntry> for AddressView {
    fn from(entry: &AddressBookEntry) -> Self {
        let address = &entry.address;
        Self {
            recipient: address.recipient.clone(),
            phone: address.phone.clone(),
            line: format!(
                "{}, {}, {}, {}",
                address.street, address.ward.name, address.district.name, address.province.name
            ),
            is_default: entry.is_default,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// New address form data; region fields carry cascade refs.
#[derive(Debug, Deserialize)]
pub struct NewAddressForm {
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub province: String,
    pub district: String,
    pub ward: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub email: String,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct AccountOrdersTemplate {
    pub orders: Vec<OrderView>,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AccountAddressesTemplate {
    pub addresses: Vec<AddressView>,
    pub provinces: Vec<RegionOptionView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the account overview.
#[instrument(skip(session, _token))]
pub async fn index(
    session: Session,
    RequireCustomer(_token): RequireCustomer,
) -> impl IntoResponse {
    let email = session
        .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()
        .map(|customer| customer.email.to_string())
        .unwrap_or_default();

    AccountIndexTemplate { email }
}

/// Display order history.
#[instrument(skip(state, token))]
pub async fn orders(
    State(state): State<AppState>,
    RequireCustomer(token): RequireCustomer,
) -> Result<AccountOrdersTemplate> {
    let orders = state.commerce().list_orders(&token).await?;

    Ok(AccountOrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Display the address book and new-address form.
#[instrument(skip(state, token))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireCustomer(token): RequireCustomer,
) -> Result<AccountAddressesTemplate> {
    let addresses = state.commerce().list_addresses(&token).await?;

    let provinces = match state.commerce().provinces().await {
        Ok(provinces) => provinces.into_iter().map(RegionOptionView::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch provinces: {e}");
            Vec::new()
        }
    };

    Ok(AccountAddressesTemplate {
        addresses: addresses.iter().map(AddressView::from).collect(),
        provinces,
    })
}

/// Save a new address.
#[instrument(skip(state, token, form))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireCustomer(token): RequireCustomer,
    Form(form): Form<NewAddressForm>,
) -> Result<Response> {
    let address = resolve_shipping_address(
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

    state.commerce().create_address(&token, &address).await?;

    Ok(Redirect::to("/account/addresses").into_response())
}
