//! Versioned persistence of the cart store.
//!
//! The blob layout is `{ "state": <CartStore>, "version": N }`. Version 2
//! made `productId` an explicit field on every line; older blobs only had the
//! line `id`, which doubled as the product id for simple products. Line ids
//! are always re-derived on restore, so a stale stored id never survives.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::aggregates::{CartStore, CatalogLookup};
use crate::storage::{KeyValueStorage, StorageError};

pub const CART_STORAGE_KEY: &str = "cart-storage";
pub const CART_STATE_VERSION: u32 = 2;

#[derive(Serialize)]
struct Envelope<'a> {
    state: &'a CartStore,
    version: u32,
}

/// Parses a stored blob, upgrading older versions in place.
pub fn restore(raw: &str) -> Result<CartStore, StorageError> {
    let envelope: Value = serde_json::from_str(raw)?;
    let version = match envelope.get("version") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| StorageError::Malformed("version is not a number".into()))?,
    };
    if version > CART_STATE_VERSION {
        return Err(StorageError::UnsupportedVersion { found: version, current: CART_STATE_VERSION });
    }
    let mut state = match envelope.get("state") {
        Some(Value::Object(state)) => state.clone(),
        _ => return Err(StorageError::Malformed("missing state object".into())),
    };
    if version < CART_STATE_VERSION {
        tracing::info!(from = version, to = CART_STATE_VERSION, "migrating stored cart");
        migrate(&mut state);
    }
    let mut cart: CartStore = serde_json::from_value(Value::Object(state))?;
    cart.normalize();
    Ok(cart)
}

fn migrate(state: &mut Map<String, Value>) {
    if let Some(Value::Array(items)) = state.get_mut("items") {
        backfill_product_ids(items);
    }
    match state.get_mut("savedCarts") {
        Some(Value::Array(saved)) => {
            for cart in saved.iter_mut() {
                if let Some(Value::Array(items)) = cart.get_mut("items") { backfill_product_ids(items); }
            }
        }
        _ => { state.insert("savedCarts".into(), Value::Array(vec![])); }
    }
    // absent metadata deserializes to a fresh one
    if matches!(state.get("metadata"), Some(Value::Null)) { state.remove("metadata"); }
    if !state.contains_key("items") || state.get("items") == Some(&Value::Null) {
        state.insert("items".into(), Value::Array(vec![]));
    }
}

fn backfill_product_ids(items: &mut [Value]) {
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        let has_product_id = matches!(item.get("productId"), Some(Value::String(s)) if !s.is_empty());
        if !has_product_id {
            if let Some(id) = item.get("id").cloned() { item.insert("productId".into(), id); }
        }
    }
}

pub fn serialize(cart: &CartStore) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&Envelope { state: cart, version: CART_STATE_VERSION })?)
}

/// A cart store that writes itself to storage after every mutation.
#[derive(Debug)]
pub struct PersistedCart<S> {
    cart: CartStore,
    storage: S,
}

impl<S: KeyValueStorage> PersistedCart<S> {
    /// Loads the stored cart, or starts an empty one with a new session id.
    pub fn load(storage: S) -> Result<Self, StorageError> {
        let cart = match storage.get(CART_STORAGE_KEY)? {
            Some(raw) => restore(&raw)?,
            None => CartStore::new(),
        };
        let mut persisted = Self { cart, storage };
        persisted.persist()?;
        Ok(persisted)
    }

    pub fn cart(&self) -> &CartStore { &self.cart }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut CartStore) -> R) -> Result<R, StorageError> {
        let result = f(&mut self.cart);
        self.persist()?;
        Ok(result)
    }

    /// Loads a share code; nothing is written unless the code was applied.
    pub async fn load_from_share_code(&mut self, code: &str, catalog: &dyn CatalogLookup) -> crate::Result<bool> {
        let loaded = self.cart.load_from_share_code(code, catalog).await?;
        if loaded { self.persist()?; }
        Ok(loaded)
    }

    pub fn load_saved_cart(&mut self, id: &str) -> crate::Result<()> {
        self.cart.load_saved_cart(id)?;
        Ok(self.persist()?)
    }

    pub fn merge_saved_cart(&mut self, id: &str) -> crate::Result<()> {
        self.cart.merge_saved_cart(id)?;
        Ok(self.persist()?)
    }

    pub fn persist(&mut self) -> Result<(), StorageError> {
        let blob = serialize(&self.cart)?;
        self.storage.set(CART_STORAGE_KEY, &blob)
    }

    pub fn into_storage(self) -> S { self.storage }
}
