use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::{entities::sources::SourceEntity, repositories::sources::SourceRepository},
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::sources},
};

pub struct SourcePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SourcePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SourceRepository for SourcePostgres {
    async fn find_active_by_id(&self, source_id: Uuid) -> Result<Option<SourceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = sources::table
            .filter(sources::id.eq(source_id))
            .filter(sources::is_active.eq(true))
            .select(SourceEntity::as_select())
            .first::<SourceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
