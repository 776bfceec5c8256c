use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::subscriptions::SubscriptionRepository,
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
            .filter(subscriptions::next_payment_on.le(now))
            .order(subscriptions::next_payment_on.asc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn claim_for_billing(
        &self,
        subscription_id: Uuid,
        claimed_by: String,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // One conditional update is the whole mutual exclusion: the claim
        // only lands when no one holds it, or the holder's claim went stale.
        // The due-date check rides along so a run working from a stale due
        // list cannot re-bill a cycle another run already advanced past.
        let claimed_rows = diesel::update(
            subscriptions::table
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
                .filter(subscriptions::next_payment_on.le(now))
                .filter(
                    subscriptions::claimed_at
                        .is_null()
                        .or(subscriptions::claimed_at.lt(stale_before)),
                ),
        )
        .set((
            subscriptions::claimed_at.eq(now),
            subscriptions::claimed_by.eq(claimed_by),
            subscriptions::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

        Ok(claimed_rows > 0)
    }

    async fn release_claim(&self, subscription_id: Uuid, claimed_by: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(
            subscriptions::table
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::claimed_by.eq(claimed_by)),
        )
        .set((
            subscriptions::claimed_at.eq::<Option<DateTime<Utc>>>(None),
            subscriptions::claimed_by.eq::<Option<String>>(None),
            subscriptions::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    async fn record_success(
        &self,
        subscription_id: Uuid,
        next_payment_on: DateTime<Utc>,
        last_payment_on: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::next_payment_on.eq(next_payment_on),
                subscriptions::last_payment_on.eq(Some(last_payment_on)),
                subscriptions::success_count.eq(subscriptions::success_count + 1),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn record_failure(&self, subscription_id: Uuid) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::failure_count.eq(subscriptions::failure_count + 1),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn cancel(&self, subscription_id: Uuid, cancelled_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Cancelled.to_string()),
                subscriptions::cancelled_at.eq(Some(cancelled_at)),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
