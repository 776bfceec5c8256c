use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::transactions::{InsertTransactionEntity, TransactionEntity},
    value_objects::enums::transaction_statuses::TransactionStatus,
};

#[automock]
#[async_trait]
pub trait TransactionRepository {
    async fn create(&self, transaction: InsertTransactionEntity) -> Result<TransactionEntity>;

    async fn find_by_id(&self, transaction_id: Uuid) -> Result<Option<TransactionEntity>>;

    async fn find_by_gateway_id(
        &self,
        gateway_transaction_id: String,
    ) -> Result<Option<TransactionEntity>>;

    /// Moves a transaction along one edge of the state machine with a single
    /// conditional update (`WHERE status IN expected`). Returns the updated
    /// row, or `None` when the current status did not match — the no-op that
    /// makes duplicate and out-of-order applications safe.
    async fn transition_status(
        &self,
        transaction_id: Uuid,
        expected: Vec<TransactionStatus>,
        to: TransactionStatus,
        gateway_transaction_id: Option<String>,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<Option<TransactionEntity>>;

    /// Stores a gateway error payload for audit without changing status; a
    /// timed-out call leaves the row in `new`.
    async fn record_gateway_error(
        &self,
        transaction_id: Uuid,
        gateway_response: serde_json::Value,
    ) -> Result<()>;
}
