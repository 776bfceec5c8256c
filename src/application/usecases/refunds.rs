use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::usecases::{
    gateway::PaymentGateway,
    transaction_ledger::{LedgerError, SettlementNotifier, TransactionLedger},
};
use crate::domain::{
    entities::transactions::TransactionEntity,
    repositories::{donors::DonorRepository, transactions::TransactionRepository},
    value_objects::{
        enums::transaction_statuses::TransactionStatus, gateway_outcomes::Outcome,
    },
};

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("transaction {0} not found")]
    TransactionNotFound(Uuid),
    #[error("transaction {transaction_id} cannot be refunded from status {status}")]
    NotRefundable {
        transaction_id: Uuid,
        status: String,
    },
    #[error("transaction {0} has no gateway transaction id")]
    MissingGatewayReference(Uuid),
    #[error("gateway rejected refund: {0}")]
    GatewayRejected(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Full refund of a settled transaction. The gateway call goes first; the
/// local transition and donor adjustment apply only after the processor
/// accepts, so the ledger never shows money returned that was not.
pub struct Refunds<G, T, D, N>
where
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    gateway: Arc<G>,
    transaction_repo: Arc<T>,
    ledger: Arc<TransactionLedger<T, D, N>>,
}

impl<G, T, D, N> Refunds<G, T, D, N>
where
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        transaction_repo: Arc<T>,
        ledger: Arc<TransactionLedger<T, D, N>>,
    ) -> Self {
        Self {
            gateway,
            transaction_repo,
            ledger,
        }
    }

    pub async fn refund(&self, transaction_id: Uuid) -> Result<TransactionEntity, RefundError> {
        let transaction = self
            .transaction_repo
            .find_by_id(transaction_id)
            .await?
            .ok_or(RefundError::TransactionNotFound(transaction_id))?;

        if transaction.status_enum() != Some(TransactionStatus::SettledPaid) {
            return Err(RefundError::NotRefundable {
                transaction_id,
                status: transaction.status.clone(),
            });
        }

        let gateway_transaction_id = transaction
            .gateway_transaction_id
            .clone()
            .ok_or(RefundError::MissingGatewayReference(transaction_id))?;

        let outcome = self
            .gateway
            .refund(&gateway_transaction_id, transaction.amount_minor)
            .await?;

        let raw = outcome.raw().cloned();
        match outcome {
            Outcome::Approved { .. } | Outcome::PendingSettlement { .. } => {
                let refunded = self
                    .ledger
                    .apply_refund(&transaction, raw)
                    .await
                    .map_err(|err| match err {
                        LedgerError::NotRefundable {
                            transaction_id,
                            status,
                        } => RefundError::NotRefundable {
                            transaction_id,
                            status,
                        },
                        other => RefundError::Internal(other.into()),
                    })?;

                info!(
                    transaction_id = %refunded.id,
                    amount_minor = refunded.amount_minor,
                    "refund completed"
                );
                Ok(refunded)
            }
            Outcome::Declined { reason_text, .. } => {
                Err(RefundError::GatewayRejected(reason_text))
            }
            Outcome::GatewayError { message, .. } => Err(RefundError::GatewayRejected(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecases::{
        gateway::MockPaymentGateway, transaction_ledger::MockSettlementNotifier,
    };
    use crate::domain::repositories::{
        donors::MockDonorRepository, transactions::MockTransactionRepository,
    };
    use crate::domain::value_objects::fees::FeeSchedule;
    use chrono::Utc;
    use mockall::predicate::eq;
    use serde_json::json;

    fn settled_transaction() -> TransactionEntity {
        let now = Utc::now();
        TransactionEntity {
            id: Uuid::new_v4(),
            subscription_id: None,
            organization_id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            channel: "card".to_string(),
            amount_minor: 5_000,
            fee_minor: 145,
            net_minor: 4_855,
            status: TransactionStatus::SettledPaid.to_string(),
            gateway_transaction_id: Some("gw_1".to_string()),
            gateway_response: None,
            idempotency_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn refunds(
        gateway: MockPaymentGateway,
        lookup: MockTransactionRepository,
        ledger_repo: MockTransactionRepository,
        donors: MockDonorRepository,
    ) -> Refunds<
        MockPaymentGateway,
        MockTransactionRepository,
        MockDonorRepository,
        MockSettlementNotifier,
    > {
        let ledger = Arc::new(TransactionLedger::new(
            Arc::new(ledger_repo),
            Arc::new(donors),
            Arc::new(MockSettlementNotifier::new()),
            FeeSchedule::default(),
        ));
        Refunds::new(Arc::new(gateway), Arc::new(lookup), ledger)
    }

    #[tokio::test]
    async fn accepted_refund_transitions_and_adjusts_donor() {
        let transaction = settled_transaction();
        let mut refunded = transaction.clone();
        refunded.status = TransactionStatus::Refunded.to_string();
        let donor_id = transaction.donor_id;

        let mut lookup = MockTransactionRepository::new();
        {
            let transaction = transaction.clone();
            lookup
                .expect_find_by_id()
                .with(eq(transaction.id))
                .times(1)
                .returning(move |_| Ok(Some(transaction.clone())));
        }

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_refund()
            .withf(|id, amount| id == "gw_1" && *amount == 5_000)
            .times(1)
            .returning(|_, _| {
                Ok(Outcome::Approved {
                    gateway_tx_id: "gw_refund_1".to_string(),
                    raw: json!({"status_code": 101}),
                })
            });

        let mut ledger_repo = MockTransactionRepository::new();
        {
            let refunded = refunded.clone();
            ledger_repo
                .expect_transition_status()
                .times(1)
                .returning(move |_, _, _, _, _| Ok(Some(refunded.clone())));
        }

        let mut donors = MockDonorRepository::new();
        donors
            .expect_apply_refund_adjustment()
            .with(eq(donor_id), eq(5_000), eq(145), eq(4_855))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let result = refunds(gateway, lookup, ledger_repo, donors)
            .refund(transaction.id)
            .await
            .unwrap();
        assert_eq!(result.status_enum(), Some(TransactionStatus::Refunded));
    }

    #[tokio::test]
    async fn non_settled_transaction_is_rejected_before_gateway_call() {
        let mut transaction = settled_transaction();
        transaction.status = TransactionStatus::Pending.to_string();

        let mut lookup = MockTransactionRepository::new();
        {
            let transaction = transaction.clone();
            lookup
                .expect_find_by_id()
                .times(1)
                .returning(move |_| Ok(Some(transaction.clone())));
        }
        // No gateway expectation: a refund call would fail the test.

        let result = refunds(
            MockPaymentGateway::new(),
            lookup,
            MockTransactionRepository::new(),
            MockDonorRepository::new(),
        )
        .refund(transaction.id)
        .await;

        assert!(matches!(result, Err(RefundError::NotRefundable { .. })));
    }

    #[tokio::test]
    async fn gateway_decline_leaves_ledger_untouched() {
        let transaction = settled_transaction();

        let mut lookup = MockTransactionRepository::new();
        {
            let transaction = transaction.clone();
            lookup
                .expect_find_by_id()
                .times(1)
                .returning(move |_| Ok(Some(transaction.clone())));
        }

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_refund().times(1).returning(|_, _| {
            Ok(Outcome::Declined {
                reason_code: Some(1620),
                reason_text: "refund window closed".to_string(),
                raw: json!({}),
            })
        });

        let result = refunds(
            gateway,
            lookup,
            MockTransactionRepository::new(),
            MockDonorRepository::new(),
        )
        .refund(transaction.id)
        .await;

        assert!(matches!(result, Err(RefundError::GatewayRejected(_))));
    }

    #[tokio::test]
    async fn missing_gateway_reference_is_rejected() {
        let mut transaction = settled_transaction();
        transaction.gateway_transaction_id = None;

        let mut lookup = MockTransactionRepository::new();
        {
            let transaction = transaction.clone();
            lookup
                .expect_find_by_id()
                .times(1)
                .returning(move |_| Ok(Some(transaction.clone())));
        }

        let result = refunds(
            MockPaymentGateway::new(),
            lookup,
            MockTransactionRepository::new(),
            MockDonorRepository::new(),
        )
        .refund(transaction.id)
        .await;

        assert!(matches!(
            result,
            Err(RefundError::MissingGatewayReference(_))
        ));
    }
}
