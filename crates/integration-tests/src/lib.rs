//! Integration test support for Curio Corner.
//!
//! Spins up an in-process stub of the commerce API on an ephemeral port so
//! the real `CommerceClient` can be exercised end-to-end: the stub owns the
//! authoritative cart and returns the full updated cart from every mutation,
//! exactly like the production API contract.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = StubCommerce::spawn().await;
//! let client = backend.client();
//! let token = StubCommerce::token();
//!
//! let cart = client
//!     .add_to_cart(&token, AddItemRequest { /* ... */ })
//!     .await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Duration, Utc};
use curio_core::{
    Cart, District, DistrictRef, LineItem, Price, ProductRef, ProductSnapshot, Province,
    ProvinceRef, ShippingAddress, Variant, VariantRef, Ward, WardRef,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;

use curio_storefront::commerce::{CommerceClient, CustomerToken};
use curio_storefront::config::CommerceConfig;

/// Bearer token the stub accepts.
pub const TEST_TOKEN: &str = "tok_integration";

/// Credentials the stub's login endpoint accepts.
pub const TEST_EMAIL: &str = "khach@example.com";
pub const TEST_PASSWORD: &str = "mua-do-co-2024";

// =============================================================================
// Stub state
// =============================================================================

#[derive(Clone)]
struct StubLine {
    product_id: ProductRef,
    variant_id: Option<VariantRef>,
    quantity: u32,
}

struct StubInner {
    catalog: Vec<ProductSnapshot>,
    cart: Vec<StubLine>,
    addresses: Vec<ShippingAddress>,
    orders_placed: u32,
}

#[derive(Clone)]
struct StubState {
    inner: Arc<Mutex<StubInner>>,
}

impl StubState {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubInner {
                catalog: seed_catalog(),
                cart: Vec::new(),
                addresses: Vec::new(),
                orders_placed: 0,
            })),
        }
    }
}

/// The catalog the stub serves.
fn seed_catalog() -> Vec<ProductSnapshot> {
    vec![
        ProductSnapshot {
            id: ProductRef::new("prod_1"),
            handle: "tin-robot".to_owned(),
            name: "Wind-up Tin Robot".to_owned(),
            description: "1970s-style lithographed tin robot.".to_owned(),
            image_url: None,
            price: Price::new(500_000),
            sale_price: None,
            stock: 10,
            has_variants: false,
            variants: Vec::new(),
        },
        ProductSnapshot {
            id: ProductRef::new("prod_2"),
            handle: "art-print".to_owned(),
            name: "Hanoi Old Quarter Art Print".to_owned(),
            description: "Limited giclée print, two editions.".to_owned(),
            image_url: None,
            price: Price::new(500_000),
            sale_price: None,
            stock: 0,
            has_variants: true,
            variants: vec![
                Variant {
                    id: VariantRef::new("var_a"),
                    name: "A3 framed".to_owned(),
                    price: Some(Price::new(600_000)),
                    sale_price: Some(Price::new(550_000)),
                    stock: Some(5),
                    is_active: true,
                },
                Variant {
                    id: VariantRef::new("var_b"),
                    name: "A4".to_owned(),
                    price: Some(Price::new(450_000)),
                    sale_price: None,
                    stock: Some(3),
                    is_active: true,
                },
            ],
        },
        ProductSnapshot {
            id: ProductRef::new("prod_3"),
            handle: "enamel-pin".to_owned(),
            name: "Banh Mi Enamel Pin".to_owned(),
            description: String::new(),
            image_url: None,
            price: Price::new(100_000),
            sale_price: None,
            stock: 4,
            has_variants: false,
            variants: Vec::new(),
        },
    ]
}

// =============================================================================
// Public API
// =============================================================================

/// A running stub commerce API.
pub struct StubCommerce {
    /// Base URL the stub is listening on.
    pub base_url: String,
}

impl StubCommerce {
    /// Bind an ephemeral port and start serving the stub.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound (test environment failure).
    pub async fn spawn() -> Self {
        let state = StubState::new();
        let app = router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub listener");
        let addr = listener.local_addr().expect("stub listener has no address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server error");
        });

        Self {
            base_url: format!("http://{addr}"),
        }
    }

    /// A `CommerceClient` pointed at this stub.
    #[must_use]
    pub fn client(&self) -> CommerceClient {
        CommerceClient::new(&CommerceConfig {
            api_url: self.base_url.clone(),
            api_key: SecretString::from("sk_test_4f3a9b2c8d1e"),
        })
    }

    /// A customer token the stub accepts.
    #[must_use]
    pub fn token() -> CustomerToken {
        CustomerToken {
            token: TEST_TOKEN.to_owned(),
            expires_at: Utc::now() + Duration::days(1),
        }
    }
}

// =============================================================================
// Router and handlers
// =============================================================================

fn router(state: StubState) -> Router {
    Router::new()
        .route("/catalog/products", get(list_products))
        .route("/catalog/products/{handle}", get(get_product))
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", put(update_quantity))
        .route("/cart/remove/{product_id}", delete(remove_from_cart))
        .route("/cart/clear", delete(clear_cart))
        .route("/promotions/apply", post(apply_promotion))
        .route("/orders", post(place_order).get(list_orders))
        .route("/regions/provinces", get(provinces))
        .route("/regions/districts", get(districts))
        .route("/regions/wards", get(wards))
        .route("/auth/login", post(login))
        .route("/account/addresses", get(list_addresses).post(create_address))
        .with_state(state)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid token" }))).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "message": message })),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"))
}

/// Render the authoritative cart in the wire shape: each line embeds the
/// full product snapshot.
fn cart_payload(inner: &StubInner) -> Cart {
    let items = inner
        .cart
        .iter()
        .filter_map(|line| {
            let product = inner
                .catalog
                .iter()
                .find(|p| p.id == line.product_id)?
                .clone();
            let variant_label = line
                .variant_id
                .as_ref()
                .and_then(|id| product.variant(id))
                .map(|v| v.name.clone());
            Some(LineItem {
                product,
                variant_id: line.variant_id.clone(),
                variant_label,
                quantity: line.quantity,
            })
        })
        .collect();

    Cart { items }
}

async fn list_products(State(state): State<StubState>) -> Response {
    let inner = state.inner.lock().expect("stub state lock");
    Json(json!({
        "products": inner.catalog,
        "page": 1,
        "total_pages": 1,
    }))
    .into_response()
}

async fn get_product(State(state): State<StubState>, Path(handle): Path<String>) -> Response {
    let inner = state.inner.lock().expect("stub state lock");
    match inner.catalog.iter().find(|p| p.handle == handle) {
        Some(product) => Json(product.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "product not found" })),
        )
            .into_response(),
    }
}

async fn get_cart(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let inner = state.inner.lock().expect("stub state lock");
    Json(cart_payload(&inner)).into_response()
}

#[derive(Deserialize)]
struct AddItemBody {
    product_id: ProductRef,
    variant_id: Option<VariantRef>,
    quantity: u32,
}

async fn add_to_cart(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().expect("stub state lock");

    if !inner.catalog.iter().any(|p| p.id == body.product_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "product not found" })),
        )
            .into_response();
    }
    if body.quantity == 0 {
        return bad_request("quantity must be at least 1");
    }

    if let Some(line) = inner
        .cart
        .iter_mut()
        .find(|line| line.product_id == body.product_id && line.variant_id == body.variant_id)
    {
        line.quantity += body.quantity;
    } else {
        inner.cart.push(StubLine {
            product_id: body.product_id,
            variant_id: body.variant_id,
            quantity: body.quantity,
        });
    }

    Json(cart_payload(&inner)).into_response()
}

#[derive(Deserialize)]
struct UpdateQuantityBody {
    product_id: ProductRef,
    variant_id: Option<VariantRef>,
    quantity: u32,
}

async fn update_quantity(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<UpdateQuantityBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().expect("stub state lock");

    if body.quantity == 0 {
        return bad_request("quantity must be at least 1");
    }

    match inner
        .cart
        .iter_mut()
        .find(|line| line.product_id == body.product_id && line.variant_id == body.variant_id)
    {
        Some(line) => line.quantity = body.quantity,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "line not found" })),
            )
                .into_response();
        }
    }

    Json(cart_payload(&inner)).into_response()
}

async fn remove_from_cart(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().expect("stub state lock");

    let product_id = ProductRef::new(product_id);
    let variant_id = query.get("variant_id").map(|v| VariantRef::new(v.clone()));
    inner
        .cart
        .retain(|line| !(line.product_id == product_id && line.variant_id == variant_id));

    Json(cart_payload(&inner)).into_response()
}

async fn clear_cart(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().expect("stub state lock");
    inner.cart.clear();
    Json(cart_payload(&inner)).into_response()
}

#[derive(Deserialize)]
struct PromotionBody {
    code: String,
    order_total: i64,
}

async fn apply_promotion(
    State(_state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<PromotionBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    match body.code.as_str() {
        // 10% off orders of 500k or more
        "TET10" => {
            if body.order_total < 500_000 {
                return bad_request("order does not qualify for this code");
            }
            Json(json!({
                "code": "TET10",
                "discount_type": "percent",
                "discount_value": 10,
                "discount": body.order_total / 10,
            }))
            .into_response()
        }
        // flat 200k off, no minimum; can exceed small subtotals
        "GIAM200K" => Json(json!({
            "code": "GIAM200K",
            "discount_type": "fixed",
            "discount_value": 200_000,
            "discount": 200_000,
        }))
        .into_response(),
        _ => bad_request("invalid promotion code"),
    }
}

async fn place_order(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(_body): Json<serde_json::Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().expect("stub state lock");

    if inner.cart.is_empty() {
        return bad_request("cart is empty");
    }

    inner.cart.clear();
    inner.orders_placed += 1;
    let order_id = format!("ord_{}", 1000 + inner.orders_placed);

    Json(json!({ "order_id": order_id })).into_response()
}

async fn list_orders(State(_state): State<StubState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn provinces() -> Json<Vec<Province>> {
    Json(vec![Province {
        id: ProvinceRef::new("p_hn"),
        name: "Hà Nội".to_owned(),
    }])
}

async fn districts(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("province").map(String::as_str) != Some("p_hn") {
        return Json(Vec::<District>::new()).into_response();
    }
    Json(vec![District {
        id: DistrictRef::new("d_hk"),
        name: "Hoàn Kiếm".to_owned(),
    }])
    .into_response()
}

async fn wards(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("district").map(String::as_str) != Some("d_hk") {
        return Json(Vec::<Ward>::new()).into_response();
    }
    Json(vec![Ward {
        id: WardRef::new("w_hb"),
        name: "Hàng Bạc".to_owned(),
    }])
    .into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email != TEST_EMAIL || body.password != TEST_PASSWORD {
        return unauthorized();
    }
    Json(json!({
        "token": TEST_TOKEN,
        "expires_at": Utc::now() + Duration::days(1),
    }))
    .into_response()
}

async fn list_addresses(State(state): State<StubState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let inner = state.inner.lock().expect("stub state lock");
    let entries: Vec<serde_json::Value> = inner
        .addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            let mut entry = serde_json::to_value(address).expect("address serializes");
            if let Some(map) = entry.as_object_mut() {
                map.insert("id".to_owned(), json!(format!("addr_{i}")));
                map.insert("is_default".to_owned(), json!(i == 0));
            }
            entry
        })
        .collect();
    Json(entries).into_response()
}

async fn create_address(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(address): Json<ShippingAddress>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    {
        let mut inner = state.inner.lock().expect("stub state lock");
        inner.addresses.push(address);
    }
    list_addresses(State(state), headers).await
}
