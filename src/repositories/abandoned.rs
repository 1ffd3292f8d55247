use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::aggregates::{AbandonedCartSnapshot, CartItem};
use crate::domain::value_objects::SessionId;
use crate::services::abandoned::{AbandonedCart, AbandonedCartRepository};
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct AbandonedRow {
    session_id: String, email: Option<String>, items: Json<Vec<CartItem>>, subtotal: Decimal,
    item_count: i32, recovered: bool, updated_at: DateTime<Utc>,
}

impl From<AbandonedRow> for AbandonedCart {
    fn from(r: AbandonedRow) -> Self {
        Self {
            snapshot: AbandonedCartSnapshot {
                session_id: SessionId::new(r.session_id), email: r.email, items: r.items.0,
                subtotal: r.subtotal, item_count: u32::try_from(r.item_count).unwrap_or(0),
            },
            updated_at: r.updated_at,
            recovered: r.recovered,
        }
    }
}

#[derive(Clone)]
pub struct PgAbandonedCartRepository { db: PgPool }

impl PgAbandonedCartRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl AbandonedCartRepository for PgAbandonedCartRepository {
    async fn upsert(&self, s: &AbandonedCartSnapshot) -> Result<()> {
        let item_count = i32::try_from(s.item_count).unwrap_or(i32::MAX);
        sqlx::query("INSERT INTO abandoned_carts (session_id, email, items, subtotal, item_count, recovered, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, FALSE, NOW(), NOW()) ON CONFLICT (session_id) DO UPDATE SET email = COALESCE(EXCLUDED.email, abandoned_carts.email), items = EXCLUDED.items, subtotal = EXCLUDED.subtotal, item_count = EXCLUDED.item_count, recovered = FALSE, updated_at = NOW()")
            .bind(s.session_id.as_str()).bind(&s.email).bind(Json(&s.items)).bind(s.subtotal).bind(item_count)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn list_unrecovered(&self) -> Result<Vec<AbandonedCart>> {
        let rows = sqlx::query_as::<_, AbandonedRow>("SELECT session_id, email, items, subtotal, item_count, recovered, updated_at FROM abandoned_carts WHERE NOT recovered ORDER BY updated_at DESC")
            .fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_recovered(&self, session: &SessionId) -> Result<bool> {
        let result = sqlx::query("UPDATE abandoned_carts SET recovered = TRUE, updated_at = NOW() WHERE session_id = $1")
            .bind(session.as_str()).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}
