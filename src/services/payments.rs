//! PayFast instant transaction notifications
//!
//! The merchant payment id carries our order id. Notifications for unknown
//! orders or with a mismatched amount are rejected before anything is written.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::{GatewayStatus, Order, PaymentStatus};
use crate::services::events::{publish_best_effort, EventPublisher};
use crate::services::orders::OrderRepository;
use crate::{EcommerceError, Result};

/// Form fields of a PayFast notification. Fields not listed are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PayfastNotification {
    pub m_payment_id: String,
    #[serde(default)]
    pub pf_payment_id: Option<String>,
    pub payment_status: String,
    pub amount_gross: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

pub struct PaymentsService {
    orders: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
    tolerance: Decimal,
    confirmed_subject: String,
}

impl PaymentsService {
    pub fn new(orders: Arc<dyn OrderRepository>, publisher: Arc<dyn EventPublisher>, tolerance: Decimal, confirmed_subject: impl Into<String>) -> Self {
        Self { orders, publisher, tolerance, confirmed_subject: confirmed_subject.into() }
    }

    pub async fn handle_notification(&self, notification: PayfastNotification) -> Result<Order> {
        let order_id = Uuid::parse_str(notification.m_payment_id.trim())
            .map_err(|_| EcommerceError::OrderNotFound(notification.m_payment_id.clone()))?;
        let mut order = self.orders.find_by_id(order_id).await?
            .ok_or_else(|| EcommerceError::OrderNotFound(notification.m_payment_id.clone()))?;

        let amount = Decimal::from_str(notification.amount_gross.trim())
            .map_err(|_| EcommerceError::InvalidRequest(format!("invalid amount_gross: {}", notification.amount_gross)))?;
        if !order.amount_matches(amount, self.tolerance) {
            tracing::warn!(order = %order.order_number(), %amount, total = %order.total(), "payfast amount mismatch");
            return Err(EcommerceError::AmountMismatch { expected: order.total(), received: amount });
        }

        let gateway = GatewayStatus::parse(&notification.payment_status);
        let change = order.apply_payment(&gateway, notification.pf_payment_id.clone());
        let events = order.take_events();
        self.orders.save_status(&order, &change).await?;
        tracing::info!(order = %order.order_number(), gateway = %gateway, payment = order.payment_status().as_str(), "payfast notification applied");

        if order.payment_status() == PaymentStatus::Paid {
            publish_best_effort(self.publisher.as_ref(), &self.confirmed_subject, events).await;
        }
        Ok(order)
    }
}
