//! Client event and error logging sink.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EcommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel { Debug, #[default] Info, Warn, Error }

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Debug => "debug", Self::Info => "info", Self::Warn => "warn", Self::Error => "error" }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn store(&self, event: &LogEvent) -> Result<()>;
}

pub struct LogService {
    repo: Arc<dyn LogRepository>,
}

impl LogService {
    pub fn new(repo: Arc<dyn LogRepository>) -> Self { Self { repo } }

    pub async fn record(&self, event: LogEvent) -> Result<()> {
        if event.message.trim().is_empty() {
            return Err(EcommerceError::InvalidRequest("message is required".into()));
        }
        let session = event.session_id.as_deref().unwrap_or("-");
        let url = event.url.as_deref().unwrap_or("-");
        match event.level {
            LogLevel::Debug => tracing::debug!(target: "client", session, url, "{}", event.message),
            LogLevel::Info => tracing::info!(target: "client", session, url, "{}", event.message),
            LogLevel::Warn => tracing::warn!(target: "client", session, url, "{}", event.message),
            LogLevel::Error => tracing::error!(target: "client", session, url, context = ?event.context, "{}", event.message),
        }
        self.repo.store(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeLogs;

    #[tokio::test]
    async fn test_record_stores_event() {
        let repo = Arc::new(FakeLogs::default());
        let service = LogService::new(repo.clone());
        let event: LogEvent = serde_json::from_str(
            r#"{"level":"error","message":"render failed","context":{"component":"Checkout"},"sessionId":"session_1"}"#,
        ).unwrap();
        service.record(event).await.unwrap();
        let stored = repo.events();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, LogLevel::Error);
        assert_eq!(stored[0].session_id.as_deref(), Some("session_1"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let repo = Arc::new(FakeLogs::default());
        let service = LogService::new(repo.clone());
        let event = LogEvent { level: LogLevel::Info, message: "  ".into(), context: None, url: None, session_id: None };
        assert!(matches!(service.record(event).await, Err(EcommerceError::InvalidRequest(_))));
        assert!(repo.events().is_empty());
    }
}
