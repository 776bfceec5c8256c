use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::{
        entities::webhook_events::InsertWebhookEventEntity,
        repositories::webhook_events::WebhookEventRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::webhook_events},
};

pub struct WebhookEventPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl WebhookEventPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WebhookEventRepository for WebhookEventPostgres {
    async fn append(&self, event: InsertWebhookEventEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(webhook_events::table)
            .values(&event)
            .returning(webhook_events::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }
}
