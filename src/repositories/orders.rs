use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderRecord, StatusChange};
use crate::services::orders::OrderRepository;
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid, order_number: String, customer_email: String, status: String, payment_status: String,
    total: Decimal, payment_reference: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order> {
        Ok(Order::restore(OrderRecord {
            id: self.id, order_number: self.order_number, customer_email: self.customer_email,
            status: self.status.parse()?, payment_status: self.payment_status.parse()?,
            total: self.total, payment_reference: self.payment_reference,
            created_at: self.created_at, updated_at: self.updated_at,
        }))
    }
}

#[derive(Clone)]
pub struct PgOrderRepository { db: PgPool }

impl PgOrderRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT id, order_number, customer_email, status, payment_status, total, payment_reference, created_at, updated_at FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn save_status(&self, order: &Order, change: &StatusChange) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE orders SET status = $2, payment_status = $3, payment_reference = $4, updated_at = $5 WHERE id = $1")
            .bind(order.id()).bind(order.status().as_str()).bind(order.payment_status().as_str())
            .bind(order.payment_reference()).bind(order.updated_at())
            .execute(&mut *tx).await?;
        sqlx::query("INSERT INTO order_status_history (id, order_id, status, payment_status, note, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(Uuid::now_v7()).bind(change.order_id).bind(change.status.as_str()).bind(change.payment_status.as_str())
            .bind(&change.note).bind(change.changed_at)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
