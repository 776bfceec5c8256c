use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::merchant_accounts::MerchantAccountEntity;

#[automock]
#[async_trait]
pub trait MerchantAccountRepository {
    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<MerchantAccountEntity>>;

    /// Applies gateway credentials from a merchant-status webhook and marks
    /// the account active.
    async fn activate(
        &self,
        organization_id: Uuid,
        gateway_user_id: String,
        gateway_user_api_key: Option<String>,
        location_id: Option<String>,
        processor_response: serde_json::Value,
    ) -> Result<()>;

    /// Stores a processor payload that carried no credentials, for audit.
    async fn store_processor_response(
        &self,
        organization_id: Uuid,
        processor_response: serde_json::Value,
    ) -> Result<()>;
}
