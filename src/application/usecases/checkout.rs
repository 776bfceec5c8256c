use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::usecases::{
    gateway::{PaymentGateway, TokenizationIntent},
    transaction_ledger::{LedgerError, NewChargeAttempt, SettlementNotifier, TransactionLedger},
};
use crate::domain::{
    entities::{merchant_accounts::MERCHANT_STATUS_ACTIVE, transactions::TransactionEntity},
    repositories::{
        donors::DonorRepository, merchant_accounts::MerchantAccountRepository,
        sources::SourceRepository, transactions::TransactionRepository,
    },
    value_objects::{
        enums::{payment_channels::PaymentChannel, transaction_statuses::TransactionStatus},
        gateway_outcomes::Outcome,
    },
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("payment source {0} not found or inactive")]
    SourceUnavailable(Uuid),
    #[error("merchant account for organization {0} is not active")]
    MerchantNotActive(Uuid),
    #[error("charge declined: {reason}")]
    Declined {
        transaction_id: Uuid,
        reason: String,
    },
    #[error("gateway unavailable: {message}")]
    GatewayUnavailable {
        transaction_id: Uuid,
        message: String,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct OneTimeCharge {
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub amount_minor: i64,
}

/// Interactive one-time charges. Unlike the billing batch, a decline here is
/// surfaced to the caller as an error so the payment form can show it.
pub struct Checkout<R, M, G, T, D, N>
where
    R: SourceRepository + Send + Sync + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    source_repo: Arc<R>,
    merchant_account_repo: Arc<M>,
    gateway: Arc<G>,
    ledger: Arc<TransactionLedger<T, D, N>>,
}

impl<R, M, G, T, D, N> Checkout<R, M, G, T, D, N>
where
    R: SourceRepository + Send + Sync + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
{
    pub fn new(
        source_repo: Arc<R>,
        merchant_account_repo: Arc<M>,
        gateway: Arc<G>,
        ledger: Arc<TransactionLedger<T, D, N>>,
    ) -> Self {
        Self {
            source_repo,
            merchant_account_repo,
            gateway,
            ledger,
        }
    }

    pub async fn charge(
        &self,
        charge: OneTimeCharge,
    ) -> Result<TransactionEntity, CheckoutError> {
        let source = self
            .source_repo
            .find_active_by_id(charge.source_id)
            .await?
            .ok_or(CheckoutError::SourceUnavailable(charge.source_id))?;

        let merchant = self
            .merchant_account_repo
            .find_by_organization(charge.organization_id)
            .await?;
        if !merchant.is_some_and(|account| account.status == MERCHANT_STATUS_ACTIVE) {
            return Err(CheckoutError::MerchantNotActive(charge.organization_id));
        }

        let channel = PaymentChannel::from_str(&source.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown payment channel {}", source.channel))?;

        let transaction = self
            .ledger
            .record_attempt(NewChargeAttempt {
                subscription_id: None,
                organization_id: charge.organization_id,
                donor_id: charge.donor_id,
                source_id: source.id,
                channel,
                amount_minor: charge.amount_minor,
            })
            .await?;

        let reference = transaction.charge_reference();
        let outcome = match channel {
            PaymentChannel::Card => {
                self.gateway
                    .charge_card(&source.gateway_token, charge.amount_minor, &reference)
                    .await?
            }
            PaymentChannel::Bank => {
                self.gateway
                    .charge_bank(&source.gateway_token, charge.amount_minor, &reference)
                    .await?
            }
        };

        let updated = self.ledger.apply_outcome(&transaction, &outcome).await?;

        match updated.status_enum() {
            Some(TransactionStatus::SettledPaid) | Some(TransactionStatus::Pending) => {
                info!(
                    transaction_id = %updated.id,
                    status = %updated.status,
                    "checkout: charge accepted"
                );
                Ok(updated)
            }
            Some(TransactionStatus::New) => Err(CheckoutError::GatewayUnavailable {
                transaction_id: updated.id,
                message: match &outcome {
                    Outcome::GatewayError { message, .. } => message.clone(),
                    _ => "gateway returned no final status".to_string(),
                },
            }),
            _ => Err(CheckoutError::Declined {
                transaction_id: updated.id,
                reason: match &outcome {
                    Outcome::Declined { reason_text, .. } => reason_text.clone(),
                    _ => "declined by gateway".to_string(),
                },
            }),
        }
    }

    /// Client token for the gateway's hosted payment form.
    pub async fn tokenization_token(
        &self,
        intent: TokenizationIntent,
    ) -> Result<String, CheckoutError> {
        Ok(self.gateway.tokenize(intent).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecases::{
        gateway::MockPaymentGateway, transaction_ledger::MockSettlementNotifier,
    };
    use crate::domain::entities::merchant_accounts::MerchantAccountEntity;
    use crate::domain::entities::sources::SourceEntity;
    use crate::domain::repositories::{
        donors::MockDonorRepository, merchant_accounts::MockMerchantAccountRepository,
        sources::MockSourceRepository, transactions::MockTransactionRepository,
    };
    use crate::domain::value_objects::fees::FeeSchedule;
    use chrono::Utc;
    use serde_json::json;

    struct Mocks {
        sources: MockSourceRepository,
        merchants: MockMerchantAccountRepository,
        gateway: MockPaymentGateway,
        transactions: MockTransactionRepository,
        donors: MockDonorRepository,
        notifier: MockSettlementNotifier,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                sources: MockSourceRepository::new(),
                merchants: MockMerchantAccountRepository::new(),
                gateway: MockPaymentGateway::new(),
                transactions: MockTransactionRepository::new(),
                donors: MockDonorRepository::new(),
                notifier: MockSettlementNotifier::new(),
            }
        }

        fn into_checkout(
            self,
        ) -> Checkout<
            MockSourceRepository,
            MockMerchantAccountRepository,
            MockPaymentGateway,
            MockTransactionRepository,
            MockDonorRepository,
            MockSettlementNotifier,
        > {
            let ledger = Arc::new(TransactionLedger::new(
                Arc::new(self.transactions),
                Arc::new(self.donors),
                Arc::new(self.notifier),
                FeeSchedule::default(),
            ));
            Checkout::new(
                Arc::new(self.sources),
                Arc::new(self.merchants),
                Arc::new(self.gateway),
                ledger,
            )
        }
    }

    fn one_time_charge() -> OneTimeCharge {
        OneTimeCharge {
            organization_id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            amount_minor: 2_500,
        }
    }

    fn active_source(charge: &OneTimeCharge) -> SourceEntity {
        let now = Utc::now();
        SourceEntity {
            id: charge.source_id,
            donor_id: charge.donor_id,
            gateway_token: "tok_1".to_string(),
            channel: "card".to_string(),
            is_default: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn active_merchant(charge: &OneTimeCharge) -> MerchantAccountEntity {
        let now = Utc::now();
        MerchantAccountEntity {
            id: Uuid::new_v4(),
            organization_id: charge.organization_id,
            gateway_user_id: Some("user_1".to_string()),
            gateway_user_api_key: None,
            location_id: None,
            status: MERCHANT_STATUS_ACTIVE.to_string(),
            processor_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_transaction(charge: &OneTimeCharge) -> TransactionEntity {
        let now = Utc::now();
        TransactionEntity {
            id: Uuid::new_v4(),
            subscription_id: None,
            organization_id: charge.organization_id,
            donor_id: charge.donor_id,
            source_id: charge.source_id,
            channel: "card".to_string(),
            amount_minor: charge.amount_minor,
            fee_minor: 88,
            net_minor: 2_412,
            status: TransactionStatus::New.to_string(),
            gateway_transaction_id: None,
            gateway_response: None,
            idempotency_ref: Some("rp-test".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn approved_charge_returns_settled_transaction() {
        let charge = one_time_charge();
        let mut mocks = Mocks::new();

        {
            let source = active_source(&charge);
            mocks
                .sources
                .expect_find_active_by_id()
                .times(1)
                .returning(move |_| Ok(Some(source.clone())));
        }
        {
            let merchant = active_merchant(&charge);
            mocks
                .merchants
                .expect_find_by_organization()
                .times(1)
                .returning(move |_| Ok(Some(merchant.clone())));
        }

        let transaction = new_transaction(&charge);
        {
            let transaction = transaction.clone();
            mocks
                .transactions
                .expect_create()
                .times(1)
                .returning(move |_| Ok(transaction.clone()));
        }
        mocks
            .gateway
            .expect_charge_card()
            .times(1)
            .returning(|_, _, _| {
                Ok(Outcome::Approved {
                    gateway_tx_id: "gw_1".to_string(),
                    raw: json!({}),
                })
            });
        {
            let mut settled = transaction.clone();
            settled.status = TransactionStatus::SettledPaid.to_string();
            mocks
                .transactions
                .expect_transition_status()
                .times(1)
                .returning(move |_, _, _, _, _| Ok(Some(settled.clone())));
        }
        mocks
            .donors
            .expect_apply_settled_totals()
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        mocks.notifier.expect_notify_settled().times(1).return_const(());

        let settled = mocks.into_checkout().charge(charge).await.unwrap();
        assert_eq!(settled.status_enum(), Some(TransactionStatus::SettledPaid));
    }

    #[tokio::test]
    async fn declined_charge_surfaces_reason_to_caller() {
        let charge = one_time_charge();
        let mut mocks = Mocks::new();

        {
            let source = active_source(&charge);
            mocks
                .sources
                .expect_find_active_by_id()
                .times(1)
                .returning(move |_| Ok(Some(source.clone())));
        }
        {
            let merchant = active_merchant(&charge);
            mocks
                .merchants
                .expect_find_by_organization()
                .times(1)
                .returning(move |_| Ok(Some(merchant.clone())));
        }

        let transaction = new_transaction(&charge);
        {
            let transaction = transaction.clone();
            mocks
                .transactions
                .expect_create()
                .times(1)
                .returning(move |_| Ok(transaction.clone()));
        }
        mocks
            .gateway
            .expect_charge_card()
            .times(1)
            .returning(|_, _, _| {
                Ok(Outcome::Declined {
                    reason_code: Some(1510),
                    reason_text: "do not honor".to_string(),
                    raw: json!({}),
                })
            });
        {
            let mut failed = transaction.clone();
            failed.status = TransactionStatus::Failed.to_string();
            mocks
                .transactions
                .expect_transition_status()
                .times(1)
                .returning(move |_, _, _, _, _| Ok(Some(failed.clone())));
        }

        match mocks.into_checkout().charge(charge).await {
            Err(CheckoutError::Declined { reason, .. }) => assert_eq!(reason, "do not honor"),
            other => panic!("expected decline, got {:?}", other.map(|t| t.status)),
        }
    }

    #[tokio::test]
    async fn inactive_merchant_blocks_checkout() {
        let charge = one_time_charge();
        let organization_id = charge.organization_id;
        let mut mocks = Mocks::new();

        {
            let source = active_source(&charge);
            mocks
                .sources
                .expect_find_active_by_id()
                .times(1)
                .returning(move |_| Ok(Some(source.clone())));
        }
        mocks
            .merchants
            .expect_find_by_organization()
            .times(1)
            .returning(|_| Ok(None));

        assert!(matches!(
            mocks.into_checkout().charge(charge).await,
            Err(CheckoutError::MerchantNotActive(id)) if id == organization_id
        ));
    }

    #[tokio::test]
    async fn missing_source_blocks_checkout() {
        let charge = one_time_charge();
        let source_id = charge.source_id;
        let mut mocks = Mocks::new();
        mocks
            .sources
            .expect_find_active_by_id()
            .times(1)
            .returning(|_| Ok(None));

        assert!(matches!(
            mocks.into_checkout().charge(charge).await,
            Err(CheckoutError::SourceUnavailable(id)) if id == source_id
        ));
    }
}
