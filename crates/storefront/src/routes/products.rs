//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use curio_core::ProductSnapshot;
use serde::Deserialize;
use tracing::instrument;

use crate::commerce::ProductQuery;
use crate::filters;
use crate::error::Result;
use crate::state::AppState;

/// Product card display data for listing pages.
#[derive(Clone)]
pub struct ProductCardView {
    pub handle: String,
    pub title: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub sold_out: bool,
    pub image_url: Option<String>,
}

impl From<&ProductSnapshot> for ProductCardView {
    fn from(product: &ProductSnapshot) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.name.clone(),
            price: product.price.display(),
            sale_price: product
                .on_sale()
                .then(|| product.sale_price.unwrap_or(product.price).display()),
            sold_out: product.stock <= 0 && product.variants.is_empty(),
            image_url: product.image_url.clone(),
        }
    }
}

/// Variant display data for the detail page.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub available: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub in_stock: bool,
    pub has_variants: bool,
    pub variants: Vec<VariantView>,
    pub image_url: Option<String>,
}

impl From<&ProductSnapshot> for ProductDetailView {
    fn from(product: &ProductSnapshot) -> Self {
        let variants = product
            .variants
            .iter()
            .map(|variant| VariantView {
                id: variant.id.to_string(),
                name: variant.name.clone(),
                price: variant
                    .sale_price
                    .filter(curio_core::Price::is_positive)
                    .or(variant.price)
                    .unwrap_or(product.price)
                    .display(),
                available: variant.is_active && variant.stock.is_none_or(|stock| stock > 0),
            })
            .collect();

        Self {
            id: product.id.to_string(),
            handle: product.handle.clone(),
            title: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            sale_price: product
                .on_sale()
                .then(|| product.sale_price.unwrap_or(product.price).display()),
            in_stock: product.stock > 0 || !product.variants.is_empty(),
            has_variants: product.has_variants,
            variants,
            image_url: product.image_url.clone(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_more_pages: bool,
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    let listing = state
        .commerce()
        .list_products(&ProductQuery {
            page,
            category: query.category.clone().filter(|c| !c.is_empty()),
            q: query.q.clone().filter(|q| !q.is_empty()),
        })
        .await?;

    Ok(ProductsIndexTemplate {
        products: listing.products.iter().map(ProductCardView::from).collect(),
        current_page: listing.page,
        total_pages: listing.total_pages,
        has_more_pages: listing.has_more_pages(),
        category: query.category,
        q: query.q,
    })
}

/// Display product detail page.
#[instrument(skip(state), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.commerce().get_product(&handle).await?;

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(&product),
    })
}
