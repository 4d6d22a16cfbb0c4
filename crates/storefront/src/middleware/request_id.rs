//! Request ID middleware for request tracing and correlation.
//!
//! Each request gets a unique ID that is recorded in the current tracing
//! span, tagged onto the Sentry scope, and echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID we accept before minting our own.
const MAX_UPSTREAM_ID_LEN: usize = 64;

/// Take the upstream proxy's request ID if it looks sane.
///
/// Anything overlong or containing non-printable characters is discarded so a
/// hostile header cannot pollute logs or Sentry tags.
fn upstream_request_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    if value.is_empty() || value.len() > MAX_UPSTREAM_ID_LEN {
        return None;
    }
    if !value.chars().all(|c| c.is_ascii_graphic()) {
        return None;
    }
    Some(value.to_owned())
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        upstream_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    // Record in current span for structured logging
    Span::current().record("request_id", &request_id);

    // Tag the Sentry scope so errors correlate with log lines
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
