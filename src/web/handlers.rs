use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{AbandonedCartSnapshot, ImportSummary, Order, OrderStatus};
use crate::domain::value_objects::SessionId;
use crate::services::{AbandonedCart, ImportRequest, LogEvent, PayfastNotification};
use crate::web::AppState;
use crate::{EcommerceError, Result};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "vapeshop-commerce"}))
}

pub async fn payfast_notify(State(s): State<AppState>, Form(n): Form<PayfastNotification>) -> Result<&'static str> {
    s.payments.handle_notification(n).await?;
    Ok("OK")
}

pub async fn import_products(State(s): State<AppState>, Json(r): Json<ImportRequest>) -> Result<Json<ImportSummary>> {
    Ok(Json(s.import.import(r).await?))
}

pub async fn record_log(State(s): State<AppState>, Json(e): Json<LogEvent>) -> Result<StatusCode> {
    s.logs.record(e).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn get_setting(State(s): State<AppState>, Path(key): Path<String>) -> Result<Json<serde_json::Value>> {
    s.settings.get(&key).await?.map(Json).ok_or(EcommerceError::SettingNotFound(key))
}

pub async fn put_setting(State(s): State<AppState>, Path(key): Path<String>, Json(value): Json<serde_json::Value>) -> Result<Json<serde_json::Value>> {
    s.settings.upsert(&key, value.clone()).await?;
    tracing::info!(%key, "setting updated");
    Ok(Json(value))
}

pub async fn capture_abandoned_cart(State(s): State<AppState>, Json(snapshot): Json<AbandonedCartSnapshot>) -> Result<StatusCode> {
    s.abandoned.capture(snapshot).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_abandoned_carts(State(s): State<AppState>) -> Result<Json<Vec<AbandonedCart>>> {
    Ok(Json(s.abandoned.list().await?))
}

pub async fn mark_cart_recovered(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    s.abandoned.mark_recovered(&SessionId::new(session)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest { pub status: String, #[serde(default)] pub note: Option<String> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse { pub id: Uuid, pub order_number: String, pub status: OrderStatus, pub payment_status: &'static str }

impl From<&Order> for OrderStatusResponse {
    fn from(o: &Order) -> Self {
        Self { id: o.id(), order_number: o.order_number().to_string(), status: o.status(), payment_status: o.payment_status().as_str() }
    }
}

pub async fn update_order_status(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<StatusUpdateRequest>) -> Result<Json<OrderStatusResponse>> {
    let next: OrderStatus = r.status.parse()?;
    let order = s.orders.change_status(id, next, r.note).await?;
    Ok(Json(OrderStatusResponse::from(&order)))
}
