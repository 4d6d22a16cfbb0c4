//! Home page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::commerce::ProductQuery;
use crate::filters;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductCardView>,
}

/// Display the home page.
///
/// A catalog failure renders an empty featured section rather than an error
/// page; the rest of the page is static.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let featured = match state
        .commerce()
        .list_products(&ProductQuery {
            page: 1,
            ..ProductQuery::default()
        })
        .await
    {
        Ok(listing) => listing
            .products
            .iter()
            .take(FEATURED_COUNT)
            .map(ProductCardView::from)
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch featured products: {e}");
            Vec::new()
        }
    };

    HomeTemplate { featured }
}
