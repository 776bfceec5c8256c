use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::webhook_events::InsertWebhookEventEntity;

#[automock]
#[async_trait]
pub trait WebhookEventRepository {
    /// Persists an inbound payload verbatim. Append-only; nothing updates or
    /// deletes these rows.
    async fn append(&self, event: InsertWebhookEventEntity) -> Result<Uuid>;
}
