use serde::Serialize;
use uuid::Uuid;

/// Per-subscription result of one billing batch. "Skipped" covers missing
/// preconditions (inactive source, merchant not active, claim held by a
/// concurrent run) and does not count toward the failure policy.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionRunOutcome {
    Succeeded {
        subscription_id: Uuid,
        transaction_id: Uuid,
    },
    Failed {
        subscription_id: Uuid,
        transaction_id: Option<Uuid>,
        reason: String,
    },
    Skipped {
        subscription_id: Uuid,
        reason: String,
    },
    Error {
        subscription_id: Uuid,
        error: String,
    },
}

/// Aggregate returned from a billing run so callers and tests can assert on
/// the batch directly instead of inspecting side effects.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BillingRunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub details: Vec<SubscriptionRunOutcome>,
}

impl BillingRunReport {
    pub fn push(&mut self, outcome: SubscriptionRunOutcome) {
        match &outcome {
            SubscriptionRunOutcome::Succeeded { .. } => self.succeeded += 1,
            SubscriptionRunOutcome::Failed { .. } => self.failed += 1,
            SubscriptionRunOutcome::Skipped { .. } => self.skipped += 1,
            SubscriptionRunOutcome::Error { .. } => self.errors += 1,
        }
        self.details.push(outcome);
    }
}
