use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    payment_channels::PaymentChannel, transaction_statuses::TransactionStatus,
};
use crate::infrastructure::postgres::schema::transactions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = transactions)]
pub struct TransactionEntity {
    pub id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub channel: String,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub net_minor: i64,
    pub status: String,
    pub gateway_transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub idempotency_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionEntity {
    /// `None` means the stored status string is not one the state machine
    /// knows; callers treat that as corrupt data, not as any real state.
    pub fn status_enum(&self) -> Option<TransactionStatus> {
        TransactionStatus::from_str(&self.status)
    }

    pub fn channel_enum(&self) -> PaymentChannel {
        PaymentChannel::from_str(&self.channel).unwrap_or_default()
    }

    /// Idempotency reference sent with the gateway call for this attempt.
    pub fn charge_reference(&self) -> String {
        self.idempotency_ref
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

// Every charge attempt inserts its row before the gateway call, so a lost
// response still leaves an auditable record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub struct InsertTransactionEntity {
    pub subscription_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub channel: String,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub net_minor: i64,
    pub status: String,
    pub idempotency_ref: Option<String>,
}
