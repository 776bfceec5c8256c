use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::sources::SourceEntity;

#[automock]
#[async_trait]
pub trait SourceRepository {
    /// The stored payment method, only if it is still active. Sources are
    /// soft-deleted, so an inactive row means "skip", not "error".
    async fn find_active_by_id(&self, source_id: Uuid) -> Result<Option<SourceEntity>>;
}
