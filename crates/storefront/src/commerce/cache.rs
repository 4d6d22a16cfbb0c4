//! Cache types for commerce API responses.
//!
//! Only read-mostly data is cached. Carts and anything else scoped to a
//! customer token must always hit the API.

use curio_core::{District, ProductSnapshot, Province, Ward};

use crate::commerce::types::ProductPage;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<ProductSnapshot>),
    Products(ProductPage),
    Provinces(Vec<Province>),
    Districts(Vec<District>),
    Wards(Vec<Ward>),
}
