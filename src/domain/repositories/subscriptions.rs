use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    /// All active subscriptions whose next charge date is on or before `now`.
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<SubscriptionEntity>>;

    /// Claims a subscription for one billing cycle with a single conditional
    /// update. Returns false when another worker holds a non-stale claim or
    /// the subscription is no longer due at `now` (its cycle was already
    /// advanced); only a successful claim may proceed to charge.
    async fn claim_for_billing(
        &self,
        subscription_id: Uuid,
        claimed_by: String,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool>;

    async fn release_claim(&self, subscription_id: Uuid, claimed_by: String) -> Result<()>;

    /// Advances the billing cycle after a successful (or provisionally
    /// successful) charge and increments the success counter.
    async fn record_success(
        &self,
        subscription_id: Uuid,
        next_payment_on: DateTime<Utc>,
        last_payment_on: DateTime<Utc>,
    ) -> Result<()>;

    /// Increments the failure counter and returns the updated row so the
    /// caller can apply the cancellation policy.
    async fn record_failure(&self, subscription_id: Uuid) -> Result<SubscriptionEntity>;

    async fn cancel(&self, subscription_id: Uuid, cancelled_at: DateTime<Utc>) -> Result<()>;
}
