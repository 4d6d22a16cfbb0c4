//! Region option fragments for the address cascade (HTMX).
//!
//! Selecting a province swaps in its district options and resets the ward
//! dropdown; selecting a district swaps in its ward options. A failed fetch
//! renders an empty option list rather than an error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use curio_core::{
    AddressCascade, District, DistrictRef, Province, ProvinceRef, ShippingAddress, Ward, WardRef,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// One `<option>` in a region dropdown.
#[derive(Clone)]
pub struct RegionOptionView {
    pub id: String,
    pub name: String,
}

impl From<Province> for RegionOptionView {
    fn from(province: Province) -> Self {
        Self {
            id: province.id.into_inner(),
            name: province.name,
        }
    }
}

impl From<District> for RegionOptionView {
    fn from(district: District) -> Self {
        Self {
            id: district.id.into_inner(),
            name: district.name,
        }
    }
}

impl From<Ward> for RegionOptionView {
    fn from(ward: Ward) -> Self {
        Self {
            id: ward.id.into_inner(),
            name: ward.name,
        }
    }
}

/// District options query.
#[derive(Debug, Deserialize)]
pub struct DistrictQuery {
    pub province: String,
}

/// Ward options query.
#[derive(Debug, Deserialize)]
pub struct WardQuery {
    pub district: String,
}

/// District dropdown fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/district_options.html")]
pub struct DistrictOptionsTemplate {
    pub districts: Vec<RegionOptionView>,
}

/// Ward dropdown fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/ward_options.html")]
pub struct WardOptionsTemplate {
    pub wards: Vec<RegionOptionView>,
}

/// District options for a province (HTMX).
#[instrument(skip(state))]
pub async fn district_options(
    State(state): State<AppState>,
    Query(query): Query<DistrictQuery>,
) -> impl IntoResponse {
    let districts = match state
        .commerce()
        .districts(&ProvinceRef::new(query.province))
        .await
    {
        Ok(districts) => districts.into_iter().map(RegionOptionView::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch districts: {e}");
            Vec::new()
        }
    };

    DistrictOptionsTemplate { districts }
}

/// Ward options for a district (HTMX).
#[instrument(skip(state))]
pub async fn ward_options(
    State(state): State<AppState>,
    Query(query): Query<WardQuery>,
) -> impl IntoResponse {
    let wards = match state
        .commerce()
        .wards(&DistrictRef::new(query.district))
        .await
    {
        Ok(wards) => wards.into_iter().map(RegionOptionView::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch wards: {e}");
            Vec::new()
        }
    };

    WardOptionsTemplate { wards }
}

// =============================================================================
// Server-side address resolution
// =============================================================================

/// Address fields as submitted by the checkout and account forms.
#[derive(Debug)]
pub struct AddressForm<'a> {
    pub recipient: &'a str,
    pub phone: &'a str,
    pub street: &'a str,
    pub province: &'a str,
    pub district: &'a str,
    pub ward: &'a str,
}

/// Rebuild the cascade server-side from submitted refs and produce a full
/// shipping address.
///
/// Each level only selects from the list fetched for the level above it, so a
/// forged or out-of-date ref cannot produce a mismatched address.
pub async fn resolve_shipping_address(
    state: &AppState,
    form: AddressForm<'_>,
) -> Result<ShippingAddress> {
    let recipient = form.recipient.trim();
    let phone = form.phone.trim();
    let street = form.street.trim();
    if recipient.is_empty() || phone.is_empty() || street.is_empty() {
        return Err(AppError::BadRequest(
            "Recipient, phone, and street address are required".to_string(),
        ));
    }

    let province_ref = ProvinceRef::new(form.province);
    let district_ref = DistrictRef::new(form.district);
    let ward_ref = WardRef::new(form.ward);

    let mut cascade = AddressCascade::new();

    let province = state
        .commerce()
        .provinces()
        .await?
        .into_iter()
        .find(|p| p.id == province_ref)
        .ok_or_else(|| AppError::BadRequest("Unknown province".to_string()))?;
    cascade.select_province(province);

    cascade.set_districts(state.commerce().districts(&province_ref).await?);
    cascade.select_district(&district_ref);

    cascade.set_wards(state.commerce().wards(&district_ref).await?);
    cascade.select_ward(&ward_ref);

    let (province, district, ward) = cascade
        .selection()
        .ok_or_else(|| AppError::BadRequest("Incomplete address selection".to_string()))?;

    Ok(ShippingAddress {
        recipient: recipient.to_string(),
        phone: phone.to_string(),
        street: street.to_string(),
        ward: ward.clone(),
        district: district.clone(),
        province: province.clone(),
    })
}
