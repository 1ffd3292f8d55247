use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::logging::{LogEvent, LogRepository};
use crate::Result;

#[derive(Clone)]
pub struct PgLogRepository { db: PgPool }

impl PgLogRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl LogRepository for PgLogRepository {
    async fn store(&self, event: &LogEvent) -> Result<()> {
        sqlx::query("INSERT INTO app_logs (id, level, message, context, url, session_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW())")
            .bind(Uuid::now_v7()).bind(event.level.as_str()).bind(&event.message).bind(&event.context)
            .bind(&event.url).bind(&event.session_id)
            .execute(&self.db).await?;
        Ok(())
    }
}
