//! Downstream event publishing over NATS.

use async_trait::async_trait;

use crate::domain::events::DomainEvent;
use crate::{EcommerceError, Result};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, subject: &str, event: &DomainEvent) -> Result<()>;
}

/// Publishes JSON-encoded events. Without a client (no `NATS_URL`) events are
/// dropped with a debug log.
#[derive(Clone)]
pub struct NatsPublisher { client: Option<async_nats::Client> }

impl NatsPublisher {
    pub fn new(client: Option<async_nats::Client>) -> Self { Self { client } }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, subject: &str, event: &DomainEvent) -> Result<()> {
        let Some(client) = &self.client else {
            tracing::debug!(subject, "nats not configured, dropping event");
            return Ok(());
        };
        let payload = serde_json::to_vec(event)?;
        client.publish(subject.to_string(), payload.into()).await.map_err(|e| EcommerceError::Publish(e.to_string()))?;
        Ok(())
    }
}

/// Publishes every event, logging failures instead of returning them.
pub async fn publish_best_effort(publisher: &dyn EventPublisher, subject: &str, events: Vec<DomainEvent>) {
    for event in events {
        if let Err(e) = publisher.publish(subject, &event).await {
            tracing::warn!(subject, error = %e, "failed to publish {}", event.subject());
        }
    }
}
