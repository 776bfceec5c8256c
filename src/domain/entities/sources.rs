use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::sources;

/// A stored payment method: an opaque gateway token, never raw account data.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = sources)]
pub struct SourceEntity {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub gateway_token: String,
    pub channel: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sources)]
pub struct InsertSourceEntity {
    pub donor_id: Uuid,
    pub gateway_token: String,
    pub channel: String,
    pub is_default: bool,
    pub is_active: bool,
}
