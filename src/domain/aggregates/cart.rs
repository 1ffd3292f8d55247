//! Cart Aggregate
//!
//! The storefront's shopping cart: live line items, named saved carts and
//! session metadata. Lines are merged on `(product_id, variant_id)`; catalog
//! and stock lookups always go through `product_id`, never the line id.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::share_code::{self, ShareCodeError, SharedLine};
use crate::domain::value_objects::{LineId, ProductId, QuantityBounds, SessionId, VariantId};
use crate::EcommerceError;

fn default_min_quantity() -> u32 { 1 }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: LineId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    pub quantity: u32,
    #[serde(default = "default_min_quantity", alias = "min_quantity")]
    pub min_quantity: u32,
    #[serde(default, alias = "max_quantity", skip_serializing_if = "Option::is_none")]
    pub max_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl CartItem {
    /// A line for `product_id`/`variant_id` with quantity bounds `[1, ∞)`.
    pub fn new(product_id: impl Into<ProductId>, variant_id: Option<VariantId>, name: impl Into<String>, price: Decimal) -> Self {
        let product_id = product_id.into();
        Self {
            id: LineId::for_product(&product_id, variant_id.as_ref()),
            product_id,
            variant_id,
            name: name.into(),
            price,
            compare_at_price: None,
            quantity: 1,
            min_quantity: 1,
            max_quantity: None,
            weight: None,
            notes: None,
            stock: None,
            image: None,
            sku: None,
        }
    }

    pub fn with_bounds(mut self, min: u32, max: Option<u32>) -> Self {
        let bounds = QuantityBounds::new(min, max);
        self.min_quantity = bounds.min;
        self.max_quantity = bounds.max;
        self.quantity = bounds.clamp(u64::from(self.quantity));
        self
    }

    pub fn with_compare_at_price(mut self, compare_at: Decimal) -> Self { self.compare_at_price = Some(compare_at); self }
    pub fn with_weight(mut self, weight: Decimal) -> Self { self.weight = Some(weight); self }
    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = Some(stock); self }

    pub fn bounds(&self) -> QuantityBounds { QuantityBounds::new(self.min_quantity, self.max_quantity) }

    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }

    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }

    pub fn line_savings(&self) -> Decimal {
        match self.compare_at_price {
            Some(compare_at) if compare_at > self.price => (compare_at - self.price) * Decimal::from(self.quantity),
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCart {
    pub id: String,
    pub name: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMetadata {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
}

impl CartMetadata {
    pub fn fresh() -> Self {
        let now = Utc::now();
        Self { session_id: SessionId::generate(), created_at: now, last_modified: now, coupon_code: None, discount_amount: None }
    }
}

impl Default for CartMetadata { fn default() -> Self { Self::fresh() } }

/// One line whose requested quantity is not covered by current stock.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIssue {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub requested: u32,
    pub available: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockValidation {
    pub valid: bool,
    pub issues: Vec<StockIssue>,
}

/// Current stock counts, by product and by variant.
#[derive(Clone, Debug, Default)]
pub struct StockLevels {
    pub products: HashMap<ProductId, u32>,
    pub variants: HashMap<VariantId, u32>,
}

impl StockLevels {
    /// Stock for a line: variant stock when the line has a variant. Unknown rows count as zero.
    pub fn available_for(&self, item: &CartItem) -> u32 {
        match &item.variant_id {
            Some(variant) => self.variants.get(variant).copied().unwrap_or(0),
            None => self.products.get(&item.product_id).copied().unwrap_or(0),
        }
    }
}

#[async_trait]
pub trait StockLookup: Send + Sync {
    async fn stock_levels(&self, product_ids: &[ProductId]) -> Result<StockLevels, EcommerceError>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// A cart line carrying the live name and price, or `None` when the product
    /// (or variant) no longer exists.
    async fn resolve(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<Option<CartItem>, EcommerceError>;
}

/// Payload for the abandoned-cart capture function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedCartSnapshot {
    pub session_id: SessionId,
    #[serde(default)]
    pub email: Option<String>,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartStore {
    items: Vec<CartItem>,
    #[serde(default)]
    saved_carts: Vec<SavedCart>,
    #[serde(default)]
    metadata: CartMetadata,
    #[serde(default)]
    is_open: bool,
}

impl Default for CartStore { fn default() -> Self { Self::new() } }

impl CartStore {
    pub fn new() -> Self {
        Self { items: vec![], saved_carts: vec![], metadata: CartMetadata::fresh(), is_open: false }
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn saved_carts(&self) -> &[SavedCart] { &self.saved_carts }
    pub fn metadata(&self) -> &CartMetadata { &self.metadata }
    pub fn is_open(&self) -> bool { self.is_open }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item(&self, id: &LineId) -> Option<&CartItem> { self.items.iter().find(|i| &i.id == id) }

    /// Adds `quantity` (default: the item's minimum) of `item`, merging into an
    /// existing line for the same product and variant.
    pub fn add_item(&mut self, item: CartItem, quantity: Option<u32>) {
        let bounds = item.bounds();
        let quantity = quantity.filter(|q| *q > 0).unwrap_or(bounds.min);
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&item.product_id, item.variant_id.as_ref())) {
            let combined = u64::from(existing.quantity) + u64::from(quantity);
            existing.quantity = existing.bounds().clamp(combined);
        } else {
            let mut line = item;
            line.id = LineId::for_product(&line.product_id, line.variant_id.as_ref());
            line.quantity = bounds.clamp(u64::from(quantity));
            self.items.push(line);
        }
        self.touch();
    }

    pub fn remove_item(&mut self, id: &LineId) {
        self.items.retain(|i| &i.id != id);
        self.touch();
    }

    /// Sets a line's quantity. Zero or below removes it; anything else is
    /// clamped into the line's bounds.
    pub fn update_quantity(&mut self, id: &LineId, quantity: i64) {
        let Ok(requested) = u64::try_from(quantity) else { return self.remove_item(id) };
        if requested == 0 { return self.remove_item(id); }
        let Some(line) = self.items.iter_mut().find(|i| &i.id == id) else { return };
        let clamped = line.bounds().clamp(requested);
        if clamped == 0 { return self.remove_item(id); }
        line.quantity = clamped;
        self.touch();
    }

    pub fn update_item_notes(&mut self, id: &LineId, notes: impl Into<String>) {
        if let Some(line) = self.items.iter_mut().find(|i| &i.id == id) {
            line.notes = Some(notes.into());
            self.touch();
        }
    }

    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.metadata.coupon_code = None;
        self.metadata.discount_amount = None;
        self.touch();
    }

    pub fn bulk_add_items(&mut self, items: impl IntoIterator<Item = (CartItem, Option<u32>)>) {
        for (item, quantity) in items { self.add_item(item, quantity); }
    }

    pub fn bulk_remove_items(&mut self, ids: &[LineId]) {
        self.items.retain(|i| !ids.contains(&i.id));
        self.touch();
    }

    /// Replaces every line. Line ids are re-derived, lines for the same
    /// product and variant are merged, and zero-quantity lines are dropped.
    pub fn replace_cart(&mut self, items: Vec<CartItem>) {
        self.items = normalize_lines(items);
        self.touch();
    }

    /// Re-derives line identities of the live cart and every saved cart.
    pub(crate) fn normalize(&mut self) {
        self.items = normalize_lines(std::mem::take(&mut self.items));
        for saved in &mut self.saved_carts {
            saved.items = normalize_lines(std::mem::take(&mut saved.items));
        }
    }

    pub fn save_cart_for_later(&mut self, name: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.saved_carts.push(SavedCart { id: id.clone(), name: name.into(), items: self.items.clone(), created_at: Utc::now() });
        self.touch();
        id
    }

    pub fn load_saved_cart(&mut self, id: &str) -> Result<(), CartError> {
        let saved = self.saved_carts.iter().find(|c| c.id == id).ok_or_else(|| CartError::SavedCartNotFound(id.to_string()))?;
        self.items = normalize_lines(saved.items.clone());
        self.touch();
        Ok(())
    }

    pub fn merge_saved_cart(&mut self, id: &str) -> Result<(), CartError> {
        let saved = self.saved_carts.iter().find(|c| c.id == id).ok_or_else(|| CartError::SavedCartNotFound(id.to_string()))?;
        let items: Vec<_> = saved.items.iter().map(|i| (i.clone(), Some(i.quantity))).collect();
        self.bulk_add_items(items);
        Ok(())
    }

    pub fn delete_saved_cart(&mut self, id: &str) {
        self.saved_carts.retain(|c| c.id != id);
        self.touch();
    }

    pub fn shareable_cart(&self) -> String {
        let lines: Vec<SharedLine> = self.items.iter().map(|i| SharedLine {
            id: i.product_id.clone(),
            v: i.variant_id.clone(),
            q: i.quantity,
        }).collect();
        share_code::encode(&lines)
    }

    pub fn decode_share_code(code: &str) -> Result<Vec<SharedLine>, ShareCodeError> { share_code::decode(code) }

    /// Decodes a share code and adds every line the catalog can still resolve.
    ///
    /// Returns `Ok(false)` for a malformed code. Every line is resolved before
    /// anything is added, so a catalog error leaves the cart untouched.
    pub async fn load_from_share_code(&mut self, code: &str, catalog: &dyn CatalogLookup) -> Result<bool, EcommerceError> {
        let lines = match Self::decode_share_code(code) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(error = %e, "rejected cart share code");
                return Ok(false);
            }
        };
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            match catalog.resolve(&line.id, line.v.as_ref()).await? {
                Some(item) => resolved.push((item, Some(line.q))),
                None => tracing::info!(product_id = %line.id, "shared cart line no longer in catalog"),
            }
        }
        self.bulk_add_items(resolved);
        Ok(true)
    }

    /// Checks every line against current stock. Advisory: the cart is never modified.
    pub async fn validate_stock(&self, lookup: &dyn StockLookup) -> Result<StockValidation, EcommerceError> {
        let product_ids: Vec<ProductId> = self.items.iter().map(|i| i.product_id.clone()).collect::<BTreeSet<_>>().into_iter().collect();
        if product_ids.is_empty() {
            return Ok(StockValidation { valid: true, issues: vec![] });
        }
        let levels = lookup.stock_levels(&product_ids).await?;
        let issues: Vec<StockIssue> = self.items.iter().filter_map(|i| {
            let available = levels.available_for(i);
            (i.quantity > available).then(|| StockIssue {
                line_id: i.id.clone(),
                product_id: i.product_id.clone(),
                variant_id: i.variant_id.clone(),
                name: i.name.clone(),
                requested: i.quantity,
                available,
            })
        }).collect();
        Ok(StockValidation { valid: issues.is_empty(), issues })
    }

    pub fn total_items(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn unique_items(&self) -> usize { self.items.len() }
    pub fn subtotal(&self) -> Decimal { self.items.iter().map(CartItem::line_total).sum() }

    /// Subtotal minus any coupon discount, never below zero.
    pub fn total_price(&self) -> Decimal {
        let discount = self.metadata.discount_amount.unwrap_or(Decimal::ZERO);
        (self.subtotal() - discount).max(Decimal::ZERO)
    }

    pub fn total_weight(&self) -> Decimal {
        self.items.iter().map(|i| i.weight.unwrap_or(Decimal::ZERO) * Decimal::from(i.quantity)).sum()
    }

    pub fn total_savings(&self) -> Decimal { self.items.iter().map(CartItem::line_savings).sum() }

    /// Records a coupon for display. The discount is not verified here.
    pub fn apply_coupon(&mut self, code: impl Into<String>, discount: Decimal) {
        self.metadata.coupon_code = Some(code.into());
        self.metadata.discount_amount = Some(discount.max(Decimal::ZERO));
        self.touch();
    }

    pub fn remove_coupon(&mut self) {
        self.metadata.coupon_code = None;
        self.metadata.discount_amount = None;
        self.touch();
    }

    pub fn set_open(&mut self, open: bool) { self.is_open = open; }
    pub fn toggle_open(&mut self) { self.is_open = !self.is_open; }

    pub fn abandoned_snapshot(&self, email: Option<String>) -> Option<AbandonedCartSnapshot> {
        if self.items.is_empty() { return None; }
        Some(AbandonedCartSnapshot {
            session_id: self.metadata.session_id.clone(),
            email,
            items: self.items.clone(),
            subtotal: self.subtotal(),
            item_count: self.total_items(),
        })
    }

    fn touch(&mut self) { self.metadata.last_modified = Utc::now(); }
}

/// Gives every line its derived id and merges lines that share one.
fn normalize_lines(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut lines: Vec<CartItem> = Vec::with_capacity(items.len());
    for mut item in items.into_iter().filter(|i| i.quantity > 0) {
        item.id = LineId::for_product(&item.product_id, item.variant_id.as_ref());
        if let Some(existing) = lines.iter_mut().find(|l| l.id == item.id) {
            let combined = u64::from(existing.quantity) + u64::from(item.quantity);
            existing.quantity = existing.bounds().clamp(combined);
        } else {
            item.quantity = item.bounds().clamp(u64::from(item.quantity));
            lines.push(item);
        }
    }
    lines
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartError {
    #[error("Saved cart not found: {0}")]
    SavedCartNotFound(String),
}
