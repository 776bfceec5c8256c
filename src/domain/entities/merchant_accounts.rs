use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::merchant_accounts;

pub const MERCHANT_STATUS_PENDING: &str = "pending";
pub const MERCHANT_STATUS_ACTIVE: &str = "active";

/// Gateway credentials and activation state for an organization. Populated
/// by the merchant-status webhook family; charging requires an active row.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = merchant_accounts)]
pub struct MerchantAccountEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub gateway_user_id: Option<String>,
    pub gateway_user_api_key: Option<String>,
    pub location_id: Option<String>,
    pub status: String,
    pub processor_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
