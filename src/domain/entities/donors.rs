use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::donors;

/// Lifetime aggregates accumulate exactly once per settled transaction and
/// are only ever reduced by an explicit refund adjustment.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = donors)]
pub struct DonorEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub amount_acum_minor: i64,
    pub fee_acum_minor: i64,
    pub net_acum_minor: i64,
    pub first_donated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
