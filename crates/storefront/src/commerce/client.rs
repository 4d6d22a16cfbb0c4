//! Commerce API client implementation.
//!
//! Plain REST over `reqwest` 0.13. Catalog and region responses are cached
//! with `moka` (5-minute TTL); cart, promotion, order, and account calls
//! always round-trip.

use std::sync::Arc;
use std::time::Duration;

use curio_core::{
    Cart, District, DistrictRef, OrderRef, Price, ProductRef, ProductSnapshot, Province,
    ProvinceRef, PromotionApplication, ShippingAddress, VariantRef, Ward,
};
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::commerce::CommerceError;
use crate::commerce::cache::CacheValue;
use crate::commerce::types::{
    AddItemRequest, AddressBookEntry, ApiErrorBody, CustomerToken, LoginRequest, OrderSummary,
    PlaceOrderRequest, PlacedOrder, ProductPage, ProductQuery, PromotionGrant, PromotionRequest,
    UpdateQuantityRequest,
};
use crate::config::CommerceConfig;

/// How long catalog and region responses stay cached.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Header carrying the storefront's access key.
const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce API.
///
/// Cheaply cloneable; all clones share one HTTP connection pool and cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Cache<String, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                http: reqwest::Client::new(),
                base_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.expose_secret().to_string(),
                cache,
            }),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{path}", self.inner.base_url);
        self.inner
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.inner.api_key)
    }

    /// Send a request and decode the JSON response.
    ///
    /// The body is read as text first so decode failures can be logged with
    /// the offending payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CommerceError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(context.to_string()));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&response_text)
                .map_or_else(
                    |_| response_text.chars().take(200).collect::<String>(),
                    |body| body.message,
                );
            tracing::error!(
                status = %status,
                context = %context,
                message = %message,
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    context = %context,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse commerce API response"
                );
                Err(CommerceError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get one page of catalog products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, CommerceError> {
        let cache_key = format!(
            "products:{}:{}:{}",
            query.page,
            query.category.as_deref().unwrap_or(""),
            query.q.as_deref().unwrap_or("")
        );

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page: ProductPage = self
            .send(
                self.request(Method::GET, "catalog/products").query(query),
                "product listing",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product(&self, handle: &str) -> Result<ProductSnapshot, CommerceError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: ProductSnapshot = self
            .send(
                self.request(Method::GET, &format!("catalog/products/{handle}")),
                &format!("product {handle}"),
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================
    //
    // Every mutation returns the full updated cart. Callers must replace any
    // local copy with the response wholesale; nothing here merges.

    /// Fetch the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &CustomerToken) -> Result<Cart, CommerceError> {
        self.send(
            self.request(Method::GET, "cart").bearer_auth(&token.token),
            "cart",
        )
        .await
    }

    /// Add an item to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token), fields(product = %request.product_id))]
    pub async fn add_to_cart(
        &self,
        token: &CustomerToken,
        request: AddItemRequest,
    ) -> Result<Cart, CommerceError> {
        self.send(
            self.request(Method::POST, "cart/add")
                .bearer_auth(&token.token)
                .json(&request),
            "cart add",
        )
        .await
    }

    /// Set the quantity of an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token), fields(product = %request.product_id, quantity = request.quantity))]
    pub async fn update_quantity(
        &self,
        token: &CustomerToken,
        request: UpdateQuantityRequest,
    ) -> Result<Cart, CommerceError> {
        self.send(
            self.request(Method::PUT, "cart/update")
                .bearer_auth(&token.token)
                .json(&request),
            "cart update",
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token), fields(product = %product_id))]
    pub async fn remove_from_cart(
        &self,
        token: &CustomerToken,
        product_id: &ProductRef,
        variant_id: Option<&VariantRef>,
    ) -> Result<Cart, CommerceError> {
        let mut request = self
            .request(Method::DELETE, &format!("cart/remove/{product_id}"))
            .bearer_auth(&token.token);
        if let Some(variant) = variant_id {
            request = request.query(&[("variant_id", variant.as_str())]);
        }
        self.send(request, "cart remove").await
    }

    /// Clear the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &CustomerToken) -> Result<Cart, CommerceError> {
        self.send(
            self.request(Method::DELETE, "cart/clear")
                .bearer_auth(&token.token),
            "cart clear",
        )
        .await
    }

    // =========================================================================
    // Promotion Methods
    // =========================================================================

    /// Validate a discount code against the current order subtotal.
    ///
    /// The returned application is bound to `order_total`; it must be
    /// re-validated if the subtotal changes afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid (`Api` with the server's
    /// message) or the API request fails.
    #[instrument(skip(self, token), fields(code = %code))]
    pub async fn apply_promotion(
        &self,
        token: &CustomerToken,
        code: &str,
        order_total: Price,
    ) -> Result<PromotionApplication, CommerceError> {
        let grant: PromotionGrant = self
            .send(
                self.request(Method::POST, "promotions/apply")
                    .bearer_auth(&token.token)
                    .json(&PromotionRequest {
                        code: code.to_string(),
                        order_total,
                    }),
                "promotion apply",
            )
            .await?;

        Ok(grant.into_application(order_total))
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order from the current cart.
    ///
    /// On success the API clears the cart server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token, request))]
    pub async fn place_order(
        &self,
        token: &CustomerToken,
        request: PlaceOrderRequest,
    ) -> Result<OrderRef, CommerceError> {
        let placed: PlacedOrder = self
            .send(
                self.request(Method::POST, "orders")
                    .bearer_auth(&token.token)
                    .json(&request),
                "order placement",
            )
            .await?;
        Ok(placed.order_id)
    }

    /// List the customer's past orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &CustomerToken) -> Result<Vec<OrderSummary>, CommerceError> {
        self.send(
            self.request(Method::GET, "orders").bearer_auth(&token.token),
            "order history",
        )
        .await
    }

    // =========================================================================
    // Region Methods
    // =========================================================================

    /// List all provinces.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Province>, CommerceError> {
        let cache_key = "regions:provinces".to_string();

        if let Some(CacheValue::Provinces(provinces)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for provinces");
            return Ok(provinces);
        }

        let provinces: Vec<Province> = self
            .send(self.request(Method::GET, "regions/provinces"), "provinces")
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Provinces(provinces.clone()))
            .await;

        Ok(provinces)
    }

    /// List the districts of a province.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(province = %province))]
    pub async fn districts(&self, province: &ProvinceRef) -> Result<Vec<District>, CommerceError> {
        let cache_key = format!("regions:districts:{province}");

        if let Some(CacheValue::Districts(districts)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for districts");
            return Ok(districts);
        }

        let districts: Vec<District> = self
            .send(
                self.request(Method::GET, "regions/districts")
                    .query(&[("province", province.as_str())]),
                "districts",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Districts(districts.clone()))
            .await;

        Ok(districts)
    }

    /// List the wards of a district.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(district = %district))]
    pub async fn wards(&self, district: &DistrictRef) -> Result<Vec<Ward>, CommerceError> {
        let cache_key = format!("regions:wards:{district}");

        if let Some(CacheValue::Wards(wards)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for wards");
            return Ok(wards);
        }

        let wards: Vec<Ward> = self
            .send(
                self.request(Method::GET, "regions/wards")
                    .query(&[("district", district.as_str())]),
                "wards",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Wards(wards.clone()))
            .await;

        Ok(wards)
    }

    // =========================================================================
    // Auth and Account Methods
    // =========================================================================

    /// Exchange credentials for a customer token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` on bad credentials, or another error if the
    /// API request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<CustomerToken, CommerceError> {
        self.send(
            self.request(Method::POST, "auth/login").json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
            "login",
        )
        .await
    }

    /// List the customer's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(
        &self,
        token: &CustomerToken,
    ) -> Result<Vec<AddressBookEntry>, CommerceError> {
        self.send(
            self.request(Method::GET, "account/addresses")
                .bearer_auth(&token.token),
            "address book",
        )
        .await
    }

    /// Save a new address and return the updated address book.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token, address))]
    pub async fn create_address(
        &self,
        token: &CustomerToken,
        address: &ShippingAddress,
    ) -> Result<Vec<AddressBookEntry>, CommerceError> {
        self.send(
            self.request(Method::POST, "account/addresses")
                .bearer_auth(&token.token)
                .json(address),
            "address create",
        )
        .await
    }
}
