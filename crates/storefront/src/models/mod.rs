//! Session-scoped models for the storefront.
//!
//! Everything durable lives in the commerce API; the only state this crate
//! keeps is what a session needs between requests.

pub mod session;

pub use session::{CurrentCustomer, keys as session_keys};
