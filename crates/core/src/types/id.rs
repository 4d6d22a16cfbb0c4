//! Newtype refs for type-safe entity references.
//!
//! The commerce API identifies every entity by an opaque string. Use the
//! `define_ref!` macro to create type-safe wrappers that prevent accidentally
//! mixing refs from different entity types.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe opaque ref wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use curio_core::define_ref;
/// define_ref!(CustomerRef);
/// define_ref!(InvoiceRef);
///
/// let customer = CustomerRef::new("cus_01");
/// let invoice = InvoiceRef::new("inv_01");
///
/// // These are different types, so this won't compile:
/// // let _: CustomerRef = invoice;
/// ```
#[macro_export]
macro_rules! define_ref {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ref from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ref and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Refs for entities owned by the commerce API
define_ref!(ProductRef);
define_ref!(VariantRef);
define_ref!(OrderRef);
define_ref!(AddressRef);
define_ref!(ProvinceRef);
define_ref!(DistrictRef);
define_ref!(WardRef);
