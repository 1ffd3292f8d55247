//! Order persistence port and admin status changes.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, StatusChange};
use crate::services::events::{publish_best_effort, EventPublisher};
use crate::{EcommerceError, Result};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>>;
    /// Writes the order's status fields and appends `change` to its history
    /// in one transaction.
    async fn save_status(&self, order: &Order, change: &StatusChange) -> Result<()>;
}

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, publisher: Arc<dyn EventPublisher>) -> Self { Self { repo, publisher } }

    pub async fn change_status(&self, id: Uuid, next: OrderStatus, note: Option<String>) -> Result<Order> {
        let mut order = self.repo.find_by_id(id).await?.ok_or_else(|| EcommerceError::OrderNotFound(id.to_string()))?;
        let change = order.transition_to(next, note)?;
        let events = order.take_events();
        self.repo.save_status(&order, &change).await?;
        tracing::info!(order = %order.order_number(), status = next.as_str(), "order status changed");
        publish_best_effort(self.publisher.as_ref(), "orders.status_changed", events).await;
        Ok(order)
    }
}
