//! In-memory fakes for the async ports.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::aggregates::{
    AbandonedCartSnapshot, CartItem, CatalogLookup, Order, ProductImportRow, StatusChange, StockLevels, StockLookup, WishlistItem,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{ProductId, SessionId, UserId, VariantId};
use crate::services::abandoned::{AbandonedCart, AbandonedCartRepository};
use crate::services::events::EventPublisher;
use crate::services::import::{InsertOutcome, ProductImportRepository};
use crate::services::logging::{LogEvent, LogRepository};
use crate::services::orders::OrderRepository;
use crate::services::settings::SettingsStore;
use crate::services::wishlist::WishlistRepository;
use crate::{EcommerceError, Result};

fn unavailable() -> EcommerceError { EcommerceError::Database(sqlx::Error::PoolTimedOut) }

#[derive(Default)]
pub(crate) struct FakeStock {
    levels: StockLevels,
    calls: AtomicUsize,
}

impl FakeStock {
    pub(crate) fn product(mut self, id: &str, stock: u32) -> Self {
        self.levels.products.insert(ProductId::from(id), stock);
        self
    }

    pub(crate) fn variant(mut self, id: &str, stock: u32) -> Self {
        self.levels.variants.insert(VariantId::from(id), stock);
        self
    }

    pub(crate) fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl StockLookup for FakeStock {
    async fn stock_levels(&self, _product_ids: &[ProductId]) -> Result<StockLevels> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.levels.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeCatalog {
    items: Vec<CartItem>,
    failing: Option<ProductId>,
}

impl FakeCatalog {
    pub(crate) fn item(mut self, item: CartItem) -> Self {
        self.items.push(item);
        self
    }

    pub(crate) fn failing_for(mut self, product_id: &str) -> Self {
        self.failing = Some(ProductId::from(product_id));
        self
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn resolve(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<Option<CartItem>> {
        if self.failing.as_ref() == Some(product_id) { return Err(unavailable()); }
        Ok(self.items.iter().find(|i| i.matches(product_id, variant_id)).cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeWishlistRepo {
    users: Mutex<HashMap<UserId, Vec<WishlistItem>>>,
    guests: Mutex<HashMap<SessionId, Vec<WishlistItem>>>,
    fail_mirror: AtomicBool,
    fail_writes: AtomicBool,
    migrations: AtomicUsize,
}

impl FakeWishlistRepo {
    pub(crate) fn guest_rows(&self, session: &SessionId) -> Vec<WishlistItem> {
        self.guests.lock().unwrap().get(session).cloned().unwrap_or_default()
    }

    pub(crate) fn user_rows(&self, user: &UserId) -> Vec<WishlistItem> {
        self.users.lock().unwrap().get(user).cloned().unwrap_or_default()
    }

    pub(crate) fn fail_mirror(&self, fail: bool) { self.fail_mirror.store(fail, Ordering::SeqCst); }
    pub(crate) fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }
    pub(crate) fn migrations(&self) -> usize { self.migrations.load(Ordering::SeqCst) }
}

#[async_trait]
impl WishlistRepository for FakeWishlistRepo {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<WishlistItem>> { Ok(self.user_rows(user)) }

    async fn add_for_user(&self, user: &UserId, item: &WishlistItem) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) { return Err(unavailable()); }
        let mut users = self.users.lock().unwrap();
        let rows = users.entry(user.clone()).or_default();
        if rows.iter().any(|r| r.matches(&item.product_id, item.variant_id.as_ref())) {
            return Err(EcommerceError::Duplicate(item.product_id.to_string()));
        }
        rows.push(item.clone());
        Ok(())
    }

    async fn remove_for_user(&self, user: &UserId, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) { return Err(unavailable()); }
        if let Some(rows) = self.users.lock().unwrap().get_mut(user) {
            rows.retain(|r| !r.matches(product_id, variant_id));
        }
        Ok(())
    }

    async fn mirror_guest(&self, session: &SessionId, items: &[WishlistItem]) -> Result<()> {
        if self.fail_mirror.load(Ordering::SeqCst) { return Err(unavailable()); }
        self.guests.lock().unwrap().insert(session.clone(), items.to_vec());
        Ok(())
    }

    async fn migrate_guest(&self, session: &SessionId, user: &UserId) -> Result<u64> {
        self.migrations.fetch_add(1, Ordering::SeqCst);
        let moved = self.guests.lock().unwrap().remove(session).unwrap_or_default();
        let mut users = self.users.lock().unwrap();
        let rows = users.entry(user.clone()).or_default();
        let mut count = 0;
        for item in moved {
            if !rows.iter().any(|r| r.matches(&item.product_id, item.variant_id.as_ref())) {
                rows.push(item);
                count += 1;
            }
        }
        Ok(count)
    }
}

#[derive(Default)]
pub(crate) struct FakeSettings {
    rows: Mutex<HashMap<String, serde_json::Value>>,
    fail_writes: AtomicBool,
}

impl FakeSettings {
    pub(crate) fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }
}

#[async_trait]
impl SettingsStore for FakeSettings {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: serde_json::Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) { return Err(unavailable()); }
        self.rows.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeOrders {
    orders: Mutex<HashMap<Uuid, Order>>,
    history: Mutex<Vec<StatusChange>>,
}

impl FakeOrders {
    pub(crate) fn insert(&self, order: Order) -> Uuid {
        let id = order.id();
        self.orders.lock().unwrap().insert(id, order);
        id
    }

    pub(crate) fn history(&self, id: Uuid) -> Vec<StatusChange> {
        self.history.lock().unwrap().iter().filter(|c| c.order_id == id).cloned().collect()
    }
}

#[async_trait]
impl OrderRepository for FakeOrders {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> { Ok(self.orders.lock().unwrap().get(&id).cloned()) }

    async fn save_status(&self, order: &Order, change: &StatusChange) -> Result<()> {
        self.orders.lock().unwrap().insert(order.id(), order.clone());
        self.history.lock().unwrap().push(change.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePublisher {
    subjects: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakePublisher {
    pub(crate) fn subjects(&self) -> Vec<String> { self.subjects.lock().unwrap().clone() }
    pub(crate) fn fail(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }
}

#[async_trait]
impl EventPublisher for FakePublisher {
    async fn publish(&self, subject: &str, _event: &DomainEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) { return Err(unavailable()); }
        self.subjects.lock().unwrap().push(subject.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeProducts {
    skus: Mutex<HashSet<String>>,
    inserted: Mutex<Vec<ProductImportRow>>,
    clears: AtomicUsize,
}

impl FakeProducts {
    pub(crate) fn existing_sku(self, sku: &str) -> Self {
        self.skus.lock().unwrap().insert(sku.to_uppercase());
        self
    }

    pub(crate) fn inserted(&self) -> Vec<ProductImportRow> { self.inserted.lock().unwrap().clone() }
    pub(crate) fn clears(&self) -> usize { self.clears.load(Ordering::SeqCst) }
}

#[async_trait]
impl ProductImportRepository for FakeProducts {
    async fn clear_all(&self) -> Result<u64> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        let mut skus = self.skus.lock().unwrap();
        let removed = skus.len() as u64;
        skus.clear();
        self.inserted.lock().unwrap().clear();
        Ok(removed)
    }

    async fn insert(&self, row: &ProductImportRow) -> Result<InsertOutcome> {
        if let Some(sku) = row.normalized_sku() {
            if !self.skus.lock().unwrap().insert(sku) { return Ok(InsertOutcome::DuplicateSku); }
        }
        self.inserted.lock().unwrap().push(row.clone());
        Ok(InsertOutcome::Inserted)
    }
}

#[derive(Default)]
pub(crate) struct FakeLogs {
    events: Mutex<Vec<LogEvent>>,
}

impl FakeLogs {
    pub(crate) fn events(&self) -> Vec<LogEvent> { self.events.lock().unwrap().clone() }
}

#[async_trait]
impl LogRepository for FakeLogs {
    async fn store(&self, event: &LogEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAbandonedCarts {
    rows: Mutex<HashMap<SessionId, AbandonedCart>>,
}

#[async_trait]
impl AbandonedCartRepository for FakeAbandonedCarts {
    async fn upsert(&self, snapshot: &AbandonedCartSnapshot) -> Result<()> {
        let row = AbandonedCart { snapshot: snapshot.clone(), updated_at: Utc::now(), recovered: false };
        self.rows.lock().unwrap().insert(snapshot.session_id.clone(), row);
        Ok(())
    }

    async fn list_unrecovered(&self) -> Result<Vec<AbandonedCart>> {
        Ok(self.rows.lock().unwrap().values().filter(|c| !c.recovered).cloned().collect())
    }

    async fn mark_recovered(&self, session: &SessionId) -> Result<bool> {
        match self.rows.lock().unwrap().get_mut(session) {
            Some(row) => {
                row.recovered = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
