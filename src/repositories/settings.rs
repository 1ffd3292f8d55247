use async_trait::async_trait;
use sqlx::PgPool;

use crate::services::settings::SettingsStore;
use crate::Result;

#[derive(Clone)]
pub struct PgSettingsStore { db: PgPool }

impl PgSettingsStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as("SELECT value FROM site_settings WHERE key = $1")
            .bind(key).fetch_optional(&self.db).await?;
        Ok(row.map(|(value,)| value))
    }

    async fn upsert(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query("INSERT INTO site_settings (key, value, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()")
            .bind(key).bind(value).execute(&self.db).await?;
        Ok(())
    }
}
