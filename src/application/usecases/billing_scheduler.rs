use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::application::usecases::{
    gateway::PaymentGateway,
    transaction_ledger::{NewChargeAttempt, SettlementNotifier, TransactionLedger},
};
use crate::domain::{
    entities::{
        merchant_accounts::MERCHANT_STATUS_ACTIVE, subscriptions::SubscriptionEntity,
        transactions::TransactionEntity,
    },
    repositories::{
        donors::DonorRepository, merchant_accounts::MerchantAccountRepository,
        sources::SourceRepository, subscriptions::SubscriptionRepository,
        transactions::TransactionRepository,
    },
    value_objects::{
        billing_reports::{BillingRunReport, SubscriptionRunOutcome},
        enums::{payment_channels::PaymentChannel, transaction_statuses::TransactionStatus},
        gateway_outcomes::Outcome,
    },
};

/// Consecutive failures after which a subscription that has never succeeded
/// is cancelled.
pub const CANCEL_AFTER_FAILURES: i32 = 4;

/// Drives one billing batch: claim each due subscription, charge it through
/// the gateway, and apply the success/failure bookkeeping. One subscription's
/// error never aborts the batch.
pub struct SubscriptionBillingScheduler<S, R, M, G, T, D, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: SourceRepository + Send + Sync + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    subscription_repo: Arc<S>,
    source_repo: Arc<R>,
    merchant_account_repo: Arc<M>,
    gateway: Arc<G>,
    ledger: Arc<TransactionLedger<T, D, N>>,
    worker_id: String,
    claim_stale_after: Duration,
}

impl<S, R, M, G, T, D, N> SubscriptionBillingScheduler<S, R, M, G, T, D, N>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: SourceRepository + Send + Sync + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        source_repo: Arc<R>,
        merchant_account_repo: Arc<M>,
        gateway: Arc<G>,
        ledger: Arc<TransactionLedger<T, D, N>>,
        worker_id: String,
        claim_stale_after: Duration,
    ) -> Self {
        Self {
            subscription_repo,
            source_repo,
            merchant_account_repo,
            gateway,
            ledger,
            worker_id,
            claim_stale_after,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<BillingRunReport> {
        let due = self.subscription_repo.list_due(now).await?;
        let mut report = BillingRunReport {
            total: due.len(),
            ..Default::default()
        };

        info!(due = due.len(), worker_id = %self.worker_id, "billing run started");

        for subscription in due {
            let subscription_id = subscription.id;
            match self.bill_one(&subscription, now).await {
                Ok(outcome) => report.push(outcome),
                Err(err) => {
                    error!(
                        subscription_id = %subscription_id,
                        error = %err,
                        "billing run: subscription errored"
                    );
                    report.push(SubscriptionRunOutcome::Error {
                        subscription_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            errors = report.errors,
            "billing run finished"
        );

        Ok(report)
    }

    async fn bill_one(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SubscriptionRunOutcome> {
        let stale_before = now - self.claim_stale_after;
        let claimed = self
            .subscription_repo
            .claim_for_billing(subscription.id, self.worker_id.clone(), now, stale_before)
            .await?;

        if !claimed {
            info!(
                subscription_id = %subscription.id,
                "billing run: claim held elsewhere, skipping"
            );
            return Ok(SubscriptionRunOutcome::Skipped {
                subscription_id: subscription.id,
                reason: "claimed by another billing run".to_string(),
            });
        }

        let outcome = self.charge_claimed(subscription, now).await;

        // The claim always comes off, whatever happened inside.
        self.subscription_repo
            .release_claim(subscription.id, self.worker_id.clone())
            .await?;

        outcome
    }

    async fn charge_claimed(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SubscriptionRunOutcome> {
        let Some(source) = self
            .source_repo
            .find_active_by_id(subscription.source_id)
            .await?
        else {
            warn!(
                subscription_id = %subscription.id,
                source_id = %subscription.source_id,
                "billing run: no active payment source, skipping"
            );
            return Ok(SubscriptionRunOutcome::Skipped {
                subscription_id: subscription.id,
                reason: "payment source missing or inactive".to_string(),
            });
        };

        let merchant = self
            .merchant_account_repo
            .find_by_organization(subscription.organization_id)
            .await?;
        let merchant_active =
            merchant.is_some_and(|account| account.status == MERCHANT_STATUS_ACTIVE);
        if !merchant_active {
            warn!(
                subscription_id = %subscription.id,
                organization_id = %subscription.organization_id,
                "billing run: merchant account not active, skipping"
            );
            return Ok(SubscriptionRunOutcome::Skipped {
                subscription_id: subscription.id,
                reason: "merchant account not active".to_string(),
            });
        }

        let Some(channel) = PaymentChannel::from_str(&source.channel) else {
            return Ok(SubscriptionRunOutcome::Error {
                subscription_id: subscription.id,
                error: format!("unknown payment channel {}", source.channel),
            });
        };

        let transaction = self
            .ledger
            .record_attempt(NewChargeAttempt {
                subscription_id: Some(subscription.id),
                organization_id: subscription.organization_id,
                donor_id: subscription.donor_id,
                source_id: source.id,
                channel,
                amount_minor: subscription.amount_minor,
            })
            .await?;

        let reference = transaction.charge_reference();
        let outcome = match channel {
            PaymentChannel::Card => {
                self.gateway
                    .charge_card(&source.gateway_token, subscription.amount_minor, &reference)
                    .await?
            }
            PaymentChannel::Bank => {
                self.gateway
                    .charge_bank(&source.gateway_token, subscription.amount_minor, &reference)
                    .await?
            }
        };

        let updated = self.ledger.apply_outcome(&transaction, &outcome).await?;

        match updated.status_enum() {
            Some(TransactionStatus::SettledPaid) | Some(TransactionStatus::Pending) => {
                self.record_success(subscription, now).await?;
                Ok(SubscriptionRunOutcome::Succeeded {
                    subscription_id: subscription.id,
                    transaction_id: updated.id,
                })
            }
            _ => {
                self.record_failure(subscription, now).await?;
                Ok(SubscriptionRunOutcome::Failed {
                    subscription_id: subscription.id,
                    transaction_id: Some(updated.id),
                    reason: failure_reason(&outcome, &updated),
                })
            }
        }
    }

    async fn record_success(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some(frequency) = subscription.frequency_enum() else {
            anyhow::bail!(
                "subscription {} has unknown frequency {}",
                subscription.id,
                subscription.frequency
            );
        };

        // Advance from the scheduled date, not from now, so a late run does
        // not drift the anchor day.
        let next_payment_on = frequency.advance(subscription.next_payment_on);
        self.subscription_repo
            .record_success(subscription.id, next_payment_on, now)
            .await?;

        info!(
            subscription_id = %subscription.id,
            next_payment_on = %next_payment_on,
            "billing run: charge succeeded, cycle advanced"
        );

        Ok(())
    }

    async fn record_failure(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let updated = self.subscription_repo.record_failure(subscription.id).await?;

        if updated.failure_count >= CANCEL_AFTER_FAILURES {
            if updated.success_count == 0 {
                self.subscription_repo.cancel(subscription.id, now).await?;
                info!(
                    subscription_id = %subscription.id,
                    failure_count = updated.failure_count,
                    "billing run: subscription cancelled after repeated failures"
                );
            } else {
                // Subscriptions with any lifetime success are never cancelled
                // automatically; they retry every cycle until resolved.
                warn!(
                    subscription_id = %subscription.id,
                    failure_count = updated.failure_count,
                    success_count = updated.success_count,
                    "billing run: subscription keeps failing but has prior successes, not cancelling"
                );
            }
        }

        Ok(())
    }
}

fn failure_reason(outcome: &Outcome, transaction: &TransactionEntity) -> String {
    match outcome {
        Outcome::Declined { reason_text, .. } => reason_text.clone(),
        Outcome::GatewayError { message, .. } => message.clone(),
        _ => format!("transaction ended in status {}", transaction.status),
    }
}
