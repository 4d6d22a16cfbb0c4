//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use curio_core::Email;
use serde::{Deserialize, Serialize};

/// Session-stored customer identity.
///
/// Minimal data stored in the session alongside the commerce API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's email address.
    pub email: Email,
}

/// Session keys for authentication and checkout data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the commerce API customer token.
    pub const CUSTOMER_TOKEN: &str = "customer_token";

    /// Key for the promotion applied during checkout.
    ///
    /// Ephemeral by design: valid only for the subtotal it was validated
    /// against and re-validated when the cart changes.
    pub const APPLIED_PROMOTION: &str = "applied_promotion";
}
