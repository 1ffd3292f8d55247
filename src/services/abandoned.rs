//! Abandoned-cart capture

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::AbandonedCartSnapshot;
use crate::domain::value_objects::SessionId;
use crate::{EcommerceError, Result};

/// A stored snapshot as listed for follow-up.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedCart {
    #[serde(flatten)]
    pub snapshot: AbandonedCartSnapshot,
    pub updated_at: DateTime<Utc>,
    pub recovered: bool,
}

#[async_trait]
pub trait AbandonedCartRepository: Send + Sync {
    /// Inserts or replaces the snapshot for its session.
    async fn upsert(&self, snapshot: &AbandonedCartSnapshot) -> Result<()>;
    async fn list_unrecovered(&self) -> Result<Vec<AbandonedCart>>;
    /// Returns false when no row exists for `session`.
    async fn mark_recovered(&self, session: &SessionId) -> Result<bool>;
}

pub struct AbandonedCartService {
    repo: Arc<dyn AbandonedCartRepository>,
}

impl AbandonedCartService {
    pub fn new(repo: Arc<dyn AbandonedCartRepository>) -> Self { Self { repo } }

    pub async fn capture(&self, snapshot: AbandonedCartSnapshot) -> Result<()> {
        if snapshot.session_id.is_empty() {
            return Err(EcommerceError::InvalidRequest("sessionId is required".into()));
        }
        if snapshot.items.is_empty() {
            return Err(EcommerceError::InvalidRequest("cart is empty".into()));
        }
        self.repo.upsert(&snapshot).await?;
        tracing::debug!(session = %snapshot.session_id, items = snapshot.item_count, "captured abandoned cart");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<AbandonedCart>> { self.repo.list_unrecovered().await }

    pub async fn mark_recovered(&self, session: &SessionId) -> Result<()> {
        if !self.repo.mark_recovered(session).await? {
            return Err(EcommerceError::AbandonedCartNotFound(session.to_string()));
        }
        Ok(())
    }
}
