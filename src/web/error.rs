use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::aggregates::OrderError;
use crate::EcommerceError;

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OrderNotFound(_) | Self::SettingNotFound(_) | Self::AbandonedCartNotFound(_) => StatusCode::NOT_FOUND,
            Self::AmountMismatch { .. } | Self::InvalidRequest(_) | Self::Order(OrderError::UnknownStatus(_)) => StatusCode::BAD_REQUEST,
            Self::Order(OrderError::InvalidTransition { .. }) | Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::Cart(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Database(_) | Self::Serialization(_) | Self::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(error = %self, status = status.as_u16(), "responding with error");
        let message = if status.is_server_error() { "Internal server error".to_string() } else { self.to_string() };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
