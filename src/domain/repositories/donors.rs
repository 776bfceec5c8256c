use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait DonorRepository {
    /// Atomically increments the donor's lifetime totals for one settled
    /// transaction. Callers guarantee at-most-once invocation per
    /// transaction via the ledger's guarded state transition.
    async fn apply_settled_totals(
        &self,
        donor_id: Uuid,
        amount_minor: i64,
        fee_minor: i64,
        net_minor: i64,
        settled_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Explicit decrement for a refunded transaction; the only path that
    /// ever reduces the aggregates.
    async fn apply_refund_adjustment(
        &self,
        donor_id: Uuid,
        amount_minor: i64,
        fee_minor: i64,
        net_minor: i64,
    ) -> Result<()>;
}
