//! Customer authentication extractors.
//!
//! The storefront does not own authentication: it forwards a bearer token
//! obtained from the commerce API's login endpoint. These extractors read
//! that token from the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::commerce::CustomerToken;
use crate::models::session_keys;

/// Extractor that requires a logged-in customer.
///
/// If no valid token is in the session, HTML requests are redirected to the
/// login page and fragment/API requests get a 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireCustomer(token): RequireCustomer,
/// ) -> impl IntoResponse {
///     // Use token to make commerce API calls
/// }
/// ```
pub struct RequireCustomer(pub CustomerToken);

/// Error returned when customer authentication is required but not present.
pub enum CustomerRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for fragment/API requests).
    Unauthorized,
}

impl IntoResponse for CustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Read a token from the session, discarding it when expired.
async fn token_from_session(session: &Session) -> Option<CustomerToken> {
    let token: CustomerToken = session
        .get(session_keys::CUSTOMER_TOKEN)
        .await
        .ok()
        .flatten()?;

    if token.expires_at <= chrono::Utc::now() {
        return None;
    }

    Some(token)
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = CustomerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(CustomerRejection::Unauthorized)?;

        let token = token_from_session(session).await.ok_or_else(|| {
            // HTMX fragment requests should not receive a redirect page
            let is_fragment =
                parts.headers.contains_key("HX-Request") || parts.uri.path().starts_with("/api/");
            if is_fragment {
                CustomerRejection::Unauthorized
            } else {
                CustomerRejection::RedirectToLogin
            }
        })?;

        Ok(Self(token))
    }
}

/// Extractor that optionally gets the customer token.
///
/// Unlike `RequireCustomer`, this does not reject the request when the
/// customer is not logged in.
pub struct OptionalCustomer(pub Option<CustomerToken>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => token_from_session(session).await,
            None => None,
        };

        Ok(Self(token))
    }
}

/// Helper to set the customer token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_customer_token(
    session: &Session,
    token: &CustomerToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CUSTOMER_TOKEN, token).await
}

/// Helper to clear the customer token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_customer_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerToken>(session_keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}
