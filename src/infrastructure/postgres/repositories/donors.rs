use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::define_sql_function;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Timestamptz};
use uuid::Uuid;

use crate::{
    domain::repositories::donors::DonorRepository,
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::donors},
};

define_sql_function! {
    fn coalesce(a: Nullable<Timestamptz>, b: Timestamptz) -> Timestamptz
}

pub struct DonorPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DonorPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DonorRepository for DonorPostgres {
    async fn apply_settled_totals(
        &self,
        donor_id: Uuid,
        amount_minor: i64,
        fee_minor: i64,
        net_minor: i64,
        settled_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(donors::table.find(donor_id))
            .set((
                donors::amount_acum_minor.eq(donors::amount_acum_minor + amount_minor),
                donors::fee_acum_minor.eq(donors::fee_acum_minor + fee_minor),
                donors::net_acum_minor.eq(donors::net_acum_minor + net_minor),
                donors::first_donated_at
                    .eq(coalesce(donors::first_donated_at, settled_at).nullable()),
                donors::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn apply_refund_adjustment(
        &self,
        donor_id: Uuid,
        amount_minor: i64,
        fee_minor: i64,
        net_minor: i64,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(donors::table.find(donor_id))
            .set((
                donors::amount_acum_minor.eq(donors::amount_acum_minor - amount_minor),
                donors::fee_acum_minor.eq(donors::fee_acum_minor - fee_minor),
                donors::net_acum_minor.eq(donors::net_acum_minor - net_minor),
                donors::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
