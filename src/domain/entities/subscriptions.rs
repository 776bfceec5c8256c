use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::frequencies::Frequency;
use crate::infrastructure::postgres::schema::subscriptions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub amount_minor: i64,
    pub frequency: String,
    pub next_payment_on: DateTime<Utc>,
    pub last_payment_on: Option<DateTime<Utc>>,
    pub success_count: i32,
    pub failure_count: i32,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn frequency_enum(&self) -> Option<Frequency> {
        Frequency::from_str(&self.frequency)
    }
}
