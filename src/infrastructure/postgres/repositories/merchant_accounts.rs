use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::{
        entities::merchant_accounts::{
            MERCHANT_STATUS_ACTIVE, MERCHANT_STATUS_PENDING, MerchantAccountEntity,
        },
        repositories::merchant_accounts::MerchantAccountRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::merchant_accounts},
};

pub struct MerchantAccountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MerchantAccountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MerchantAccountRepository for MerchantAccountPostgres {
    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<MerchantAccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = merchant_accounts::table
            .filter(merchant_accounts::organization_id.eq(organization_id))
            .select(MerchantAccountEntity::as_select())
            .first::<MerchantAccountEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn activate(
        &self,
        organization_id: Uuid,
        gateway_user_id: String,
        gateway_user_api_key: Option<String>,
        location_id: Option<String>,
        processor_response: serde_json::Value,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            merchant_accounts::table
                .filter(merchant_accounts::organization_id.eq(organization_id)),
        )
        .set((
            merchant_accounts::gateway_user_id.eq(Some(gateway_user_id.clone())),
            merchant_accounts::gateway_user_api_key.eq(gateway_user_api_key.clone()),
            merchant_accounts::location_id.eq(location_id.clone()),
            merchant_accounts::status.eq(MERCHANT_STATUS_ACTIVE),
            merchant_accounts::processor_response.eq(Some(processor_response.clone())),
            merchant_accounts::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        if updated == 0 {
            diesel::insert_into(merchant_accounts::table)
                .values((
                    merchant_accounts::organization_id.eq(organization_id),
                    merchant_accounts::gateway_user_id.eq(Some(gateway_user_id)),
                    merchant_accounts::gateway_user_api_key.eq(gateway_user_api_key),
                    merchant_accounts::location_id.eq(location_id),
                    merchant_accounts::status.eq(MERCHANT_STATUS_ACTIVE),
                    merchant_accounts::processor_response.eq(Some(processor_response)),
                ))
                .execute(&mut conn)?;
        }

        Ok(())
    }

    async fn store_processor_response(
        &self,
        organization_id: Uuid,
        processor_response: serde_json::Value,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            merchant_accounts::table
                .filter(merchant_accounts::organization_id.eq(organization_id)),
        )
        .set((
            merchant_accounts::processor_response.eq(Some(processor_response.clone())),
            merchant_accounts::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        if updated == 0 {
            diesel::insert_into(merchant_accounts::table)
                .values((
                    merchant_accounts::organization_id.eq(organization_id),
                    merchant_accounts::status.eq(MERCHANT_STATUS_PENDING),
                    merchant_accounts::processor_response.eq(Some(processor_response)),
                ))
                .execute(&mut conn)?;
        }

        Ok(())
    }
}
