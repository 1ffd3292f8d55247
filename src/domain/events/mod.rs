//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentConfirmed { order_id: Uuid, order_number: String, total: Decimal },
    StatusChanged { order_id: Uuid, status: OrderStatus },
}

impl DomainEvent {
    /// NATS subject suffix for this event.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::PaymentConfirmed { .. }) => "payment_confirmed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "status_changed",
        }
    }
}
