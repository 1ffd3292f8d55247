use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::WishlistItem;
use crate::domain::value_objects::{ProductId, SessionId, UserId, VariantId};
use crate::services::wishlist::WishlistRepository;
use crate::{EcommerceError, Result};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow { product_id: String, variant_id: Option<String>, created_at: DateTime<Utc> }

impl From<WishlistRow> for WishlistItem {
    fn from(r: WishlistRow) -> Self {
        Self { product_id: ProductId::new(r.product_id), variant_id: r.variant_id.map(VariantId::new), added_at: r.created_at }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().and_then(|d| d.code()).as_deref() == Some(UNIQUE_VIOLATION)
}

#[derive(Clone)]
pub struct PgWishlistRepository { db: PgPool }

impl PgWishlistRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl WishlistRepository for PgWishlistRepository {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<WishlistItem>> {
        let rows = sqlx::query_as::<_, WishlistRow>("SELECT product_id, variant_id, created_at FROM wishlists WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.as_str()).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_for_user(&self, user: &UserId, item: &WishlistItem) -> Result<()> {
        let result = sqlx::query("INSERT INTO wishlists (id, user_id, product_id, variant_id, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::now_v7()).bind(user.as_str()).bind(item.product_id.as_str())
            .bind(item.variant_id.as_ref().map(VariantId::as_str)).bind(item.added_at)
            .execute(&self.db).await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(EcommerceError::Duplicate(item.product_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_for_user(&self, user: &UserId, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<()> {
        sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3")
            .bind(user.as_str()).bind(product_id.as_str()).bind(variant_id.map(VariantId::as_str))
            .execute(&self.db).await?;
        Ok(())
    }

    async fn mirror_guest(&self, session: &SessionId, items: &[WishlistItem]) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM guest_wishlists WHERE session_id = $1").bind(session.as_str()).execute(&mut *tx).await?;
        for item in items {
            sqlx::query("INSERT INTO guest_wishlists (id, session_id, product_id, variant_id, created_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(Uuid::now_v7()).bind(session.as_str()).bind(item.product_id.as_str())
                .bind(item.variant_id.as_ref().map(VariantId::as_str)).bind(item.added_at)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_guest(&self, session: &SessionId, user: &UserId) -> Result<u64> {
        let mut tx = self.db.begin().await?;
        let moved = sqlx::query("INSERT INTO wishlists (id, user_id, product_id, variant_id, created_at) SELECT gen_random_uuid(), $2, product_id, variant_id, created_at FROM guest_wishlists WHERE session_id = $1 ON CONFLICT DO NOTHING")
            .bind(session.as_str()).bind(user.as_str())
            .execute(&mut *tx).await?.rows_affected();
        sqlx::query("DELETE FROM guest_wishlists WHERE session_id = $1").bind(session.as_str()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(moved)
    }
}
