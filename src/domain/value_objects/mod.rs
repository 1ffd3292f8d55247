//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
            pub fn as_str(&self) -> &str { &self.0 }
            pub fn is_empty(&self) -> bool { self.0.trim().is_empty() }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self { Self(value.to_string()) }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self { Self(value) }
        }
    };
}

string_id!(
    /// Catalog reference to a product row.
    ProductId
);
string_id!(
    /// Catalog reference to a product variant row.
    VariantId
);
string_id!(
    /// Identity of one cart line. Derived from the product and variant, never
    /// used to look anything up in the catalog.
    LineId
);
string_id!(
    /// Anonymous per-browser session identity.
    SessionId
);
string_id!(
    /// Authenticated user id.
    UserId
);

impl LineId {
    /// Line identity for a (product, variant) pair, `product` or
    /// `product:variant`. `%` and `:` inside either part are percent-escaped,
    /// so distinct pairs never share an id.
    pub fn for_product(product_id: &ProductId, variant_id: Option<&VariantId>) -> Self {
        match variant_id {
            Some(variant) => Self(format!("{}:{}", escape_part(&product_id.0), escape_part(&variant.0))),
            None => Self(escape_part(&product_id.0).into_owned()),
        }
    }
}

fn escape_part(part: &str) -> Cow<'_, str> {
    if part.contains(['%', ':']) {
        Cow::Owned(part.replace('%', "%25").replace(':', "%3A"))
    } else {
        Cow::Borrowed(part)
    }
}

impl SessionId {
    pub fn generate() -> Self { Self(format!("session_{}", Uuid::new_v4().simple())) }
}

/// Inclusive quantity bounds of a purchasable unit. `max` of `None` is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityBounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl QuantityBounds {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        // a max below min collapses onto min
        let max = max.map(|m| m.max(min));
        Self { min, max }
    }

    pub fn clamp(&self, requested: u64) -> u32 {
        let upper = u64::from(self.max.unwrap_or(u32::MAX));
        let clamped = requested.min(upper).max(u64::from(self.min));
        u32::try_from(clamped).unwrap_or(u32::MAX)
    }
}

impl Default for QuantityBounds {
    fn default() -> Self { Self { min: 1, max: None } }
}
