use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::{
        entities::transactions::{InsertTransactionEntity, TransactionEntity},
        repositories::transactions::TransactionRepository,
        value_objects::enums::transaction_statuses::TransactionStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::transactions},
};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn create(&self, transaction: InsertTransactionEntity) -> Result<TransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(transactions::table)
            .values(&transaction)
            .returning(TransactionEntity::as_returning())
            .get_result::<TransactionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, transaction_id: Uuid) -> Result<Option<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = transactions::table
            .find(transaction_id)
            .select(TransactionEntity::as_select())
            .first::<TransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_gateway_id(
        &self,
        gateway_transaction_id: String,
    ) -> Result<Option<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = transactions::table
            .filter(transactions::gateway_transaction_id.eq(gateway_transaction_id))
            .select(TransactionEntity::as_select())
            .first::<TransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn transition_status(
        &self,
        transaction_id: Uuid,
        expected: Vec<TransactionStatus>,
        to: TransactionStatus,
        gateway_transaction_id: Option<String>,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<Option<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();

        // Single conditional update; the status filter is the whole guard.
        let result = diesel::update(
            transactions::table
                .filter(transactions::id.eq(transaction_id))
                .filter(transactions::status.eq_any(expected)),
        )
        .set((
            transactions::status.eq(to.to_string()),
            transactions::updated_at.eq(Utc::now()),
            gateway_transaction_id.map(|id| transactions::gateway_transaction_id.eq(id)),
            gateway_response.map(|raw| transactions::gateway_response.eq(raw)),
        ))
        .returning(TransactionEntity::as_returning())
        .get_result::<TransactionEntity>(&mut conn)
        .optional()?;

        Ok(result)
    }

    async fn record_gateway_error(
        &self,
        transaction_id: Uuid,
        gateway_response: serde_json::Value,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(transactions::table.find(transaction_id))
            .set((
                transactions::gateway_response.eq(gateway_response),
                transactions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
