//! Order Aggregate
//!
//! Orders are created at checkout by the storefront. This aggregate owns the
//! status rules used by the payment notification handler and by the admin
//! status buttons.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Cancelled }

/// `payment_status` values sent by the PayFast gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayStatus { Complete, Failed, Cancelled, Other(String) }

impl GatewayStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// The (order status, payment status) pair a gateway status maps to.
    pub fn order_statuses(&self) -> (OrderStatus, PaymentStatus) {
        match self {
            Self::Complete => (OrderStatus::Processing, PaymentStatus::Paid),
            Self::Failed => (OrderStatus::Pending, PaymentStatus::Failed),
            Self::Cancelled => (OrderStatus::Cancelled, PaymentStatus::Cancelled),
            Self::Other(_) => (OrderStatus::Pending, PaymentStatus::Pending),
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("COMPLETE"),
            Self::Failed => f.write_str("FAILED"),
            Self::Cancelled => f.write_str("CANCELLED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Cancelled) | (Processing, Shipped) | (Processing, Cancelled) | (Shipped, Delivered)
        )
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed", Self::Cancelled => "cancelled" }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Plain stored form of an order, as read from the orders table.
#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of order status history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusChange {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub note: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    order_number: String,
    customer_email: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    total: Decimal,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    pub fn create(order_number: impl Into<String>, customer_email: impl Into<String>, total: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), order_number: order_number.into(), customer_email: customer_email.into(),
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending, total,
            payment_reference: None, created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn restore(r: OrderRecord) -> Self {
        Self {
            id: r.id, order_number: r.order_number, customer_email: r.customer_email, status: r.status,
            payment_status: r.payment_status, total: r.total, payment_reference: r.payment_reference,
            created_at: r.created_at, updated_at: r.updated_at, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn customer_email(&self) -> &str { &self.customer_email }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn total(&self) -> Decimal { self.total }
    pub fn payment_reference(&self) -> Option<&str> { self.payment_reference.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Whether a gateway amount matches the order total within `tolerance`.
    pub fn amount_matches(&self, amount: Decimal, tolerance: Decimal) -> bool {
        (amount - self.total).abs() <= tolerance
    }

    /// Applies a gateway notification. The gateway is authoritative, so no
    /// transition check is made here.
    pub fn apply_payment(&mut self, gateway: &GatewayStatus, reference: Option<String>) -> StatusChange {
        let (status, payment_status) = gateway.order_statuses();
        self.status = status;
        self.payment_status = payment_status;
        if reference.is_some() { self.payment_reference = reference.clone(); }
        self.touch();
        if payment_status == PaymentStatus::Paid {
            self.raise_event(DomainEvent::Order(OrderEvent::PaymentConfirmed {
                order_id: self.id,
                order_number: self.order_number.clone(),
                total: self.total,
            }));
        }
        let note = match reference {
            Some(r) => format!("PayFast payment {gateway} (ref {r})"),
            None => format!("PayFast payment {gateway}"),
        };
        self.history_entry(note)
    }

    /// Admin status change, checked against the allowed transitions.
    pub fn transition_to(&mut self, next: OrderStatus, note: Option<String>) -> Result<StatusChange, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, status: next }));
        Ok(self.history_entry(note.unwrap_or_else(|| format!("Status changed to {}", next.as_str()))))
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }

    fn history_entry(&self, note: String) -> StatusChange {
        StatusChange { order_id: self.id, status: self.status, payment_status: self.payment_status, note, changed_at: self.updated_at }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move order from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}
