//! Typed client for the Curio Corner commerce API.
//!
//! # Architecture
//!
//! - The commerce API is the source of truth - NO local sync, direct calls
//! - Plain REST/JSON; request and response bodies are the `curio_core` shapes
//! - In-memory caching via `moka` for catalog and region lists (5 minute TTL)
//! - Carts are never cached: every mutation returns the full updated cart and
//!   the response replaces local state wholesale
//!
//! # Example
//!
//! ```rust,ignore
//! use curio_storefront::commerce::{AddItemRequest, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce);
//!
//! let product = client.get_product("tin-robot").await?;
//! let cart = client
//!     .add_to_cart(&token, AddItemRequest {
//!         product_id: product.id.clone(),
//!         variant_id: None,
//!         quantity: 1,
//!     })
//!     .await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, truncated.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Customer token missing, expired, or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("product tin-robot".to_string());
        assert_eq!(err.to_string(), "Not found: product tin-robot");
    }

    #[test]
    fn test_api_error_display() {
        let err = CommerceError::Api {
            status: 422,
            message: "quantity must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 422): quantity must be at least 1"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CommerceError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
