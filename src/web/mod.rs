//! HTTP surface: back-office functions called by the storefront, the admin
//! screens and the payment gateway.

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{AbandonedCartService, ImportService, LogService, OrderService, PaymentsService, SettingsStore};

mod error;
pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentsService>,
    pub import: Arc<ImportService>,
    pub logs: Arc<LogService>,
    pub settings: Arc<dyn SettingsStore>,
    pub abandoned: Arc<AbandonedCartService>,
    pub orders: Arc<OrderService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/payments/payfast/notify", post(handlers::payfast_notify))
        .route("/api/v1/products/import", post(handlers::import_products))
        .route("/api/v1/logs", post(handlers::record_log))
        .route("/api/v1/settings/:key", get(handlers::get_setting).put(handlers::put_setting))
        .route("/api/v1/abandoned-carts", get(handlers::list_abandoned_carts).post(handlers::capture_abandoned_cart))
        .route("/api/v1/abandoned-carts/:session/recovered", post(handlers::mark_cart_recovered))
        .route("/api/v1/orders/:id/status", patch(handlers::update_order_status))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use rust_decimal::Decimal;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::Order;
    use crate::test_support::{FakeAbandonedCarts, FakeLogs, FakeOrders, FakeProducts, FakePublisher, FakeSettings};

    struct Harness { app: Router, orders: Arc<FakeOrders>, logs: Arc<FakeLogs> }

    fn harness() -> Harness {
        let orders = Arc::new(FakeOrders::default());
        let logs = Arc::new(FakeLogs::default());
        let publisher = Arc::new(FakePublisher::default());
        let state = AppState {
            payments: Arc::new(PaymentsService::new(orders.clone(), publisher.clone(), Decimal::new(1, 2), "orders.payment_confirmed")),
            import: Arc::new(ImportService::new(Arc::new(FakeProducts::default()))),
            logs: Arc::new(LogService::new(logs.clone())),
            settings: Arc::new(FakeSettings::default()),
            abandoned: Arc::new(AbandonedCartService::new(Arc::new(FakeAbandonedCarts::default()))),
            orders: Arc::new(OrderService::new(orders.clone(), publisher)),
        };
        Harness { app: router(state), orders, logs }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())).unwrap()
    }

    fn form_request(uri: &str, body: String) -> Request<Body> {
        Request::builder().method("POST").uri(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let response = h.app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_payfast_notify_statuses() {
        let h = harness();
        let id = h.orders.insert(Order::create("VS-3001", "a@b.co", Decimal::new(19900, 2)));

        let ok = form_request("/api/v1/payments/payfast/notify", format!("m_payment_id={id}&pf_payment_id=77&payment_status=COMPLETE&amount_gross=199.00"));
        let response = h.app.clone().oneshot(ok).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.orders.history(id).len(), 1);

        let mismatch = form_request("/api/v1/payments/payfast/notify", format!("m_payment_id={id}&payment_status=COMPLETE&amount_gross=1.00"));
        assert_eq!(h.app.clone().oneshot(mismatch).await.unwrap().status(), StatusCode::BAD_REQUEST);

        let unknown = form_request("/api/v1/payments/payfast/notify", format!("m_payment_id={}&payment_status=COMPLETE&amount_gross=1.00", Uuid::now_v7()));
        let response = h.app.oneshot(unknown).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("Order not found"));
        assert_eq!(h.orders.history(id).len(), 1);
    }

    #[tokio::test]
    async fn test_import_returns_summary() {
        let h = harness();
        let body = serde_json::json!({
            "products": [
                {"name": "Herb grinder", "sku": "g-1", "price": "149.99", "stock": 4},
                {"name": "Herb grinder", "sku": "G-1", "price": 149.99},
                {"name": "", "price": 10}
            ],
            "clearExisting": false
        });
        let response = h.app.oneshot(json_request("POST", "/api/v1/products/import", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["imported"], 1);
        assert_eq!(summary["skipped"], 1);
        assert_eq!(summary["errors"], 1);
        assert_eq!(summary["errorDetails"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let h = harness();
        let missing = h.app.clone().oneshot(Request::builder().uri("/api/v1/settings/banner").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let put = json_request("PUT", "/api/v1/settings/banner", serde_json::json!({"text": "Free delivery over R500"}));
        assert_eq!(h.app.clone().oneshot(put).await.unwrap().status(), StatusCode::OK);

        let response = h.app.oneshot(Request::builder().uri("/api/v1/settings/banner").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(body_json(response).await["text"], "Free delivery over R500");
    }

    #[tokio::test]
    async fn test_logs_are_stored() {
        let h = harness();
        let request = json_request("POST", "/api/v1/logs", serde_json::json!({"level": "warn", "message": "slow checkout", "url": "/checkout"}));
        assert_eq!(h.app.oneshot(request).await.unwrap().status(), StatusCode::ACCEPTED);
        assert_eq!(h.logs.events()[0].url.as_deref(), Some("/checkout"));
    }

    #[tokio::test]
    async fn test_abandoned_cart_flow() {
        let h = harness();
        let snapshot = serde_json::json!({
            "sessionId": "session_abc",
            "email": "shopper@example.com",
            "items": [{"id": "p1", "productId": "p1", "name": "Rolling tray", "price": "89.00", "quantity": 1}],
            "subtotal": "89.00",
            "itemCount": 1
        });
        assert_eq!(h.app.clone().oneshot(json_request("POST", "/api/v1/abandoned-carts", snapshot)).await.unwrap().status(), StatusCode::NO_CONTENT);

        let list = h.app.clone().oneshot(Request::builder().uri("/api/v1/abandoned-carts").body(Body::empty()).unwrap()).await.unwrap();
        let carts = body_json(list).await;
        assert_eq!(carts[0]["sessionId"], "session_abc");
        assert_eq!(carts[0]["recovered"], false);

        let recovered = Request::builder().method("POST").uri("/api/v1/abandoned-carts/session_abc/recovered").body(Body::empty()).unwrap();
        assert_eq!(h.app.clone().oneshot(recovered).await.unwrap().status(), StatusCode::NO_CONTENT);
        let unknown = Request::builder().method("POST").uri("/api/v1/abandoned-carts/session_zzz/recovered").body(Body::empty()).unwrap();
        assert_eq!(h.app.oneshot(unknown).await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_order_status_transitions() {
        let h = harness();
        let id = h.orders.insert(Order::create("VS-4001", "a@b.co", Decimal::new(5000, 2)));
        let uri = format!("/api/v1/orders/{id}/status");

        let response = h.app.clone().oneshot(json_request("PATCH", &uri, serde_json::json!({"status": "processing"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "processing");

        let invalid = h.app.clone().oneshot(json_request("PATCH", &uri, serde_json::json!({"status": "pending"}))).await.unwrap();
        assert_eq!(invalid.status(), StatusCode::CONFLICT);

        let unknown = h.app.oneshot(json_request("PATCH", &uri, serde_json::json!({"status": "lost"}))).await.unwrap();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }
}
