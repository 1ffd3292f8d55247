//! Remote key/value settings
//!
//! One JSON document per key: banner config, PWA manifest fields, theme,
//! custom icons, brand assets, category metadata.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

pub const THEME_CONFIG_KEY: &str = "theme_config";
pub const CUSTOM_ICONS_KEY: &str = "custom_icons";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn upsert(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Reads `key` and decodes it, treating an absent row as `None`.
pub async fn get_typed<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn put_typed<T: Serialize + Sync>(store: &dyn SettingsStore, key: &str, value: &T) -> Result<()> {
    store.upsert(key, serde_json::to_value(value)?).await
}
