use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::transactions::{InsertTransactionEntity, TransactionEntity},
    repositories::{donors::DonorRepository, transactions::TransactionRepository},
    value_objects::{
        enums::{payment_channels::PaymentChannel, transaction_statuses::TransactionStatus},
        fees::FeeSchedule,
        gateway_outcomes::{GatewayErrorKind, Outcome},
    },
};

/// Notification sent after a transaction settles. Fire-and-forget: delivery
/// failures never roll back the financial transition.
#[derive(Debug, Clone)]
pub struct SettlementNotification {
    pub transaction_id: Uuid,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub amount_minor: i64,
    pub channel: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait SettlementNotifier: Send + Sync {
    fn notify_settled(&self, notification: SettlementNotification);
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("charge amount must be positive, got {0}")]
    InvalidAmount(i64),
    #[error("transaction {0} not found")]
    TransactionNotFound(Uuid),
    #[error("transaction {transaction_id} is not refundable from status {status}")]
    NotRefundable { transaction_id: Uuid, status: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Context for one charge attempt, recorded before the gateway is called.
#[derive(Debug, Clone)]
pub struct NewChargeAttempt {
    pub subscription_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub channel: PaymentChannel,
    pub amount_minor: i64,
}

/// Owns the Transaction entity and its state machine:
///
/// ```text
/// New --(Approved, card)--> SettledPaid
/// New --(Approved/PendingSettlement, bank)--> Pending
/// New --(Declined)--> Failed
/// Pending --(webhook: settled)--> SettledPaid
/// Pending --(webhook: failed)--> Failed
/// SettledPaid --(refund)--> Refunded
/// ```
///
/// Transitions are conditional updates in the repository, so an edge that
/// does not match the current status is a logged no-op — the property that
/// makes duplicate and out-of-order webhook delivery safe. Donor lifetime
/// totals are applied on the edge into `SettledPaid` and nowhere else, so
/// they fire at most once per transaction.
pub struct TransactionLedger<T, D, N>
where
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    transaction_repo: Arc<T>,
    donor_repo: Arc<D>,
    notifier: Arc<N>,
    fee_schedule: FeeSchedule,
}

impl<T, D, N> TransactionLedger<T, D, N>
where
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    pub fn new(
        transaction_repo: Arc<T>,
        donor_repo: Arc<D>,
        notifier: Arc<N>,
        fee_schedule: FeeSchedule,
    ) -> Self {
        Self {
            transaction_repo,
            donor_repo,
            notifier,
            fee_schedule,
        }
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        self.fee_schedule
    }

    /// Creates the `new` row before any gateway call, so even a lost
    /// response leaves an auditable record.
    pub async fn record_attempt(&self, attempt: NewChargeAttempt) -> LedgerResult<TransactionEntity> {
        if attempt.amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(attempt.amount_minor));
        }

        let fee_minor = self.fee_schedule.fee(attempt.amount_minor)?;
        let net_minor = FeeSchedule::net(attempt.amount_minor, fee_minor);
        let idempotency_ref = format!("rp-{}-{}", Uuid::new_v4(), Utc::now().timestamp_millis());

        let transaction = self
            .transaction_repo
            .create(InsertTransactionEntity {
                subscription_id: attempt.subscription_id,
                organization_id: attempt.organization_id,
                donor_id: attempt.donor_id,
                source_id: attempt.source_id,
                channel: attempt.channel.to_string(),
                amount_minor: attempt.amount_minor,
                fee_minor,
                net_minor,
                status: TransactionStatus::New.to_string(),
                idempotency_ref: Some(idempotency_ref),
            })
            .await?;

        info!(
            transaction_id = %transaction.id,
            subscription_id = ?attempt.subscription_id,
            amount_minor = attempt.amount_minor,
            fee_minor,
            net_minor,
            channel = %attempt.channel,
            "ledger: charge attempt recorded"
        );

        Ok(transaction)
    }

    /// Applies a synchronous gateway outcome to a `new` transaction.
    pub async fn apply_outcome(
        &self,
        transaction: &TransactionEntity,
        outcome: &Outcome,
    ) -> LedgerResult<TransactionEntity> {
        match outcome {
            Outcome::Approved { gateway_tx_id, raw } => {
                let to = match transaction.channel_enum() {
                    PaymentChannel::Card => TransactionStatus::SettledPaid,
                    // Bank debits are never instantly final; the clearance
                    // webhook performs the settled transition later.
                    PaymentChannel::Bank => TransactionStatus::Pending,
                };
                self.transition(
                    transaction,
                    vec![TransactionStatus::New],
                    to,
                    Some(gateway_tx_id.clone()),
                    Some(raw.clone()),
                )
                .await
            }
            Outcome::PendingSettlement { gateway_tx_id, raw } => {
                self.transition(
                    transaction,
                    vec![TransactionStatus::New],
                    TransactionStatus::Pending,
                    Some(gateway_tx_id.clone()),
                    Some(raw.clone()),
                )
                .await
            }
            Outcome::Declined {
                reason_code,
                reason_text,
                raw,
            } => {
                info!(
                    transaction_id = %transaction.id,
                    reason_code = ?reason_code,
                    reason_text = %reason_text,
                    "ledger: gateway declined charge"
                );
                self.transition(
                    transaction,
                    vec![TransactionStatus::New],
                    TransactionStatus::Failed,
                    None,
                    Some(raw.clone()),
                )
                .await
            }
            Outcome::GatewayError { kind, message } => {
                // No transition: the row stays `new` and is never silently
                // assumed successful. The error payload is kept for audit.
                warn!(
                    transaction_id = %transaction.id,
                    kind = ?kind,
                    message = %message,
                    "ledger: gateway error, transaction left in new"
                );
                self.transaction_repo
                    .record_gateway_error(
                        transaction.id,
                        serde_json::json!({
                            "error": message,
                            "transient": *kind == GatewayErrorKind::Transient,
                        }),
                    )
                    .await?;
                Ok(transaction.clone())
            }
        }
    }

    /// Applies an asynchronous settlement decision (from the webhook
    /// reconciler) to a pending bank transaction. Returns `None` when the
    /// edge did not apply — a duplicate or out-of-order delivery.
    pub async fn apply_remote_settlement(
        &self,
        transaction: &TransactionEntity,
        settled: bool,
    ) -> LedgerResult<Option<TransactionEntity>> {
        let to = if settled {
            TransactionStatus::SettledPaid
        } else {
            TransactionStatus::Failed
        };

        let updated = self
            .transaction_repo
            .transition_status(
                transaction.id,
                vec![TransactionStatus::Pending],
                to,
                None,
                None,
            )
            .await?;

        match updated {
            Some(updated) => {
                if to == TransactionStatus::SettledPaid {
                    self.settle(&updated).await?;
                }
                Ok(Some(updated))
            }
            None => {
                info!(
                    transaction_id = %transaction.id,
                    current_status = %transaction.status,
                    requested = %to,
                    "ledger: remote settlement did not apply, no-op"
                );
                Ok(None)
            }
        }
    }

    /// Refunds a settled transaction and applies the explicit donor
    /// adjustment — the only path that ever decrements lifetime totals.
    pub async fn apply_refund(
        &self,
        transaction: &TransactionEntity,
        refund_response: Option<serde_json::Value>,
    ) -> LedgerResult<TransactionEntity> {
        let updated = self
            .transaction_repo
            .transition_status(
                transaction.id,
                vec![TransactionStatus::SettledPaid],
                TransactionStatus::Refunded,
                None,
                refund_response,
            )
            .await?;

        let updated = updated.ok_or_else(|| LedgerError::NotRefundable {
            transaction_id: transaction.id,
            status: transaction.status.clone(),
        })?;

        self.donor_repo
            .apply_refund_adjustment(
                updated.donor_id,
                updated.amount_minor,
                updated.fee_minor,
                updated.net_minor,
            )
            .await?;

        info!(
            transaction_id = %updated.id,
            donor_id = %updated.donor_id,
            amount_minor = updated.amount_minor,
            "ledger: transaction refunded"
        );

        Ok(updated)
    }

    async fn transition(
        &self,
        transaction: &TransactionEntity,
        expected: Vec<TransactionStatus>,
        to: TransactionStatus,
        gateway_transaction_id: Option<String>,
        gateway_response: Option<serde_json::Value>,
    ) -> LedgerResult<TransactionEntity> {
        let updated = self
            .transaction_repo
            .transition_status(
                transaction.id,
                expected,
                to,
                gateway_transaction_id,
                gateway_response,
            )
            .await?;

        match updated {
            Some(updated) => {
                info!(
                    transaction_id = %updated.id,
                    from = %transaction.status,
                    to = %to,
                    "ledger: transaction transitioned"
                );
                if to == TransactionStatus::SettledPaid {
                    self.settle(&updated).await?;
                }
                Ok(updated)
            }
            None => {
                // Duplicate or out-of-order application; protected by design.
                warn!(
                    transaction_id = %transaction.id,
                    current_status = %transaction.status,
                    requested = %to,
                    "ledger: transition did not match current status, no-op"
                );
                Ok(transaction.clone())
            }
        }
    }

    /// Runs once per transaction: callers only reach this from the single
    /// successful conditional update into `SettledPaid`.
    async fn settle(&self, transaction: &TransactionEntity) -> LedgerResult<()> {
        self.donor_repo
            .apply_settled_totals(
                transaction.donor_id,
                transaction.amount_minor,
                transaction.fee_minor,
                transaction.net_minor,
                Utc::now(),
            )
            .await?;

        self.notifier.notify_settled(SettlementNotification {
            transaction_id: transaction.id,
            organization_id: transaction.organization_id,
            donor_id: transaction.donor_id,
            amount_minor: transaction.amount_minor,
            channel: transaction.channel.clone(),
        });

        info!(
            transaction_id = %transaction.id,
            donor_id = %transaction.donor_id,
            amount_minor = transaction.amount_minor,
            "ledger: transaction settled, donor totals applied"
        );

        Ok(())
    }
}
