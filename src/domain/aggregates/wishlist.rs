//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ProductId, VariantId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn new(product_id: impl Into<ProductId>, variant_id: Option<VariantId>) -> Self {
        Self { product_id: product_id.into(), variant_id, added_at: Utc::now() }
    }

    /// Variant-less entries only match variant-less lookups.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }
}

/// The currently loaded list of liked products.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new(items: Vec<WishlistItem>) -> Self { Self { items } }
    pub fn items(&self) -> &[WishlistItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn contains(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.items.iter().any(|i| i.matches(product_id, variant_id))
    }

    /// Returns `false` when the pair was already present.
    pub fn insert(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product_id, item.variant_id.as_ref()) { return false; }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, variant_id));
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_matching() {
        let mut list = Wishlist::default();
        assert!(list.insert(WishlistItem::new("p1", None)));
        assert!(list.insert(WishlistItem::new("p1", Some("blue".into()))));
        assert!(!list.insert(WishlistItem::new("p1", None)));

        let p1 = ProductId::from("p1");
        assert!(list.contains(&p1, None));
        assert!(list.contains(&p1, Some(&VariantId::from("blue"))));
        assert!(!list.contains(&p1, Some(&VariantId::from("red"))));

        assert!(list.remove(&p1, None));
        assert!(!list.contains(&p1, None));
        assert_eq!(list.len(), 1);
    }
}
