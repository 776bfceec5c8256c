use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::usecases::transaction_ledger::{SettlementNotifier, TransactionLedger};
use crate::domain::{
    entities::webhook_events::InsertWebhookEventEntity,
    repositories::{
        donors::DonorRepository, merchant_accounts::MerchantAccountRepository,
        transactions::TransactionRepository, webhook_events::WebhookEventRepository,
    },
    value_objects::{
        gateway_outcomes::{REASON_SUCCESS, STATUS_APPROVED, STATUS_PENDING},
        gateway_webhooks::{
            GatewayWebhook, MerchantStatusEvent, TransactionStatusEvent, route_payload,
        },
    },
};

/// What the reconciler did with an inbound payload. All variants acknowledge
/// the delivery; the gateway retries on its own schedule and replays must
/// stay harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    TransactionSettled(Uuid),
    TransactionFailed(Uuid),
    /// The payload matched a transaction but no state change applied, either
    /// an interim notification or a replay of one already processed.
    TransactionNoop,
    /// No local row for the referenced gateway transaction. Logged and acked;
    /// the verbatim event row is the audit trail.
    TransactionUnknown(String),
    MerchantActivated(Uuid),
    MerchantResponseStored(Uuid),
    Ignored,
}

/// Reconciles asynchronous gateway notifications against the ledger.
///
/// Persist first, interpret second: the verbatim payload is appended to the
/// event log before any routing, so a crash mid-processing loses nothing.
pub struct WebhookReconciler<W, T, D, N, M>
where
    W: WebhookEventRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
{
    webhook_event_repo: Arc<W>,
    transaction_repo: Arc<T>,
    ledger: Arc<TransactionLedger<T, D, N>>,
    merchant_account_repo: Arc<M>,
}

impl<W, T, D, N, M> WebhookReconciler<W, T, D, N, M>
where
    W: WebhookEventRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DonorRepository + Send + Sync + 'static,
    N: SettlementNotifier + 'static,
    M: MerchantAccountRepository + Send + Sync + 'static,
{
    pub fn new(
        webhook_event_repo: Arc<W>,
        transaction_repo: Arc<T>,
        ledger: Arc<TransactionLedger<T, D, N>>,
        merchant_account_repo: Arc<M>,
    ) -> Self {
        Self {
            webhook_event_repo,
            transaction_repo,
            ledger,
            merchant_account_repo,
        }
    }

    pub async fn process(&self, payload: Value) -> anyhow::Result<ReconcileResult> {
        let routed = route_payload(&payload);
        let kind = match &routed {
            GatewayWebhook::TransactionStatus(_) => "transaction_status",
            GatewayWebhook::MerchantStatus(_) => "merchant_status",
            GatewayWebhook::Unknown => "unknown",
        };

        let event_id = self
            .webhook_event_repo
            .append(InsertWebhookEventEntity {
                kind: kind.to_string(),
                payload: payload.clone(),
            })
            .await?;

        info!(event_id = %event_id, kind, "webhook: payload persisted");

        match routed {
            GatewayWebhook::TransactionStatus(event) => self.reconcile_transaction(event).await,
            GatewayWebhook::MerchantStatus(event) => {
                self.reconcile_merchant(event, payload).await
            }
            GatewayWebhook::Unknown => {
                warn!(event_id = %event_id, "webhook: unrecognized payload shape, ignoring");
                Ok(ReconcileResult::Ignored)
            }
        }
    }

    async fn reconcile_transaction(
        &self,
        event: TransactionStatusEvent,
    ) -> anyhow::Result<ReconcileResult> {
        let Some(transaction) = self
            .transaction_repo
            .find_by_gateway_id(event.id.clone())
            .await?
        else {
            warn!(
                gateway_transaction_id = %event.id,
                "webhook: no matching transaction, acknowledging"
            );
            return Ok(ReconcileResult::TransactionUnknown(event.id));
        };

        let settled = match event.status_code {
            Some(STATUS_APPROVED) => true,
            // Still clearing; a later notification carries the final word.
            Some(STATUS_PENDING) => {
                info!(
                    transaction_id = %transaction.id,
                    "webhook: interim pending notification, no change"
                );
                return Ok(ReconcileResult::TransactionNoop);
            }
            Some(_) => false,
            None => match event.reason_code_id {
                Some(REASON_SUCCESS) => true,
                Some(_) => false,
                // An id with no status or reason carries no verdict; wait
                // for a notification that does.
                None => {
                    warn!(
                        transaction_id = %transaction.id,
                        gateway_transaction_id = %event.id,
                        "webhook: payload carries no status or reason code, no change"
                    );
                    return Ok(ReconcileResult::TransactionNoop);
                }
            },
        };

        match self
            .ledger
            .apply_remote_settlement(&transaction, settled)
            .await?
        {
            Some(updated) if settled => Ok(ReconcileResult::TransactionSettled(updated.id)),
            Some(updated) => Ok(ReconcileResult::TransactionFailed(updated.id)),
            None => Ok(ReconcileResult::TransactionNoop),
        }
    }

    async fn reconcile_merchant(
        &self,
        event: MerchantStatusEvent,
        payload: Value,
    ) -> anyhow::Result<ReconcileResult> {
        let Ok(organization_id) = Uuid::parse_str(&event.client_app_id) else {
            warn!(
                client_app_id = %event.client_app_id,
                "webhook: merchant payload with unparseable organization id"
            );
            return Ok(ReconcileResult::Ignored);
        };

        let Some(user) = event.users.first() else {
            // Interim onboarding stages carry no credentials yet.
            self.merchant_account_repo
                .store_processor_response(organization_id, payload)
                .await?;
            return Ok(ReconcileResult::MerchantResponseStored(organization_id));
        };

        self.merchant_account_repo
            .activate(
                organization_id,
                user.user_id.clone(),
                user.user_api_key.clone(),
                event.resolve_location_id(),
                payload,
            )
            .await?;

        info!(
            organization_id = %organization_id,
            stage = ?event.stage,
            "webhook: merchant account activated"
        );

        Ok(ReconcileResult::MerchantActivated(organization_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecases::transaction_ledger::MockSettlementNotifier;
    use crate::domain::entities::transactions::TransactionEntity;
    use crate::domain::repositories::{
        donors::MockDonorRepository, merchant_accounts::MockMerchantAccountRepository,
        transactions::MockTransactionRepository, webhook_events::MockWebhookEventRepository,
    };
    use crate::domain::value_objects::enums::transaction_statuses::TransactionStatus;
    use crate::domain::value_objects::fees::FeeSchedule;
    use chrono::Utc;
    use mockall::predicate::{always, eq};
    use serde_json::json;

    struct Mocks {
        events: MockWebhookEventRepository,
        transactions_lookup: MockTransactionRepository,
        transactions_ledger: MockTransactionRepository,
        donors: MockDonorRepository,
        notifier: MockSettlementNotifier,
        merchants: MockMerchantAccountRepository,
    }

    impl Mocks {
        fn new() -> Self {
            let mut events = MockWebhookEventRepository::new();
            events
                .expect_append()
                .returning(|_| Ok(Uuid::new_v4()));
            Self {
                events,
                transactions_lookup: MockTransactionRepository::new(),
                transactions_ledger: MockTransactionRepository::new(),
                donors: MockDonorRepository::new(),
                notifier: MockSettlementNotifier::new(),
                merchants: MockMerchantAccountRepository::new(),
            }
        }

        fn into_reconciler(
            self,
        ) -> WebhookReconciler<
            MockWebhookEventRepository,
            MockTransactionRepository,
            MockDonorRepository,
            MockSettlementNotifier,
            MockMerchantAccountRepository,
        > {
            let ledger = Arc::new(TransactionLedger::new(
                Arc::new(self.transactions_ledger),
                Arc::new(self.donors),
                Arc::new(self.notifier),
                FeeSchedule::default(),
            ));
            WebhookReconciler::new(
                Arc::new(self.events),
                Arc::new(self.transactions_lookup),
                ledger,
                Arc::new(self.merchants),
            )
        }
    }

    fn pending_transaction(gateway_id: &str) -> TransactionEntity {
        let now = Utc::now();
        TransactionEntity {
            id: Uuid::new_v4(),
            subscription_id: None,
            organization_id: Uuid::new_v4(),
            donor_id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            channel: "bank".to_string(),
            amount_minor: 5_000,
            fee_minor: 145,
            net_minor: 4_855,
            status: TransactionStatus::Pending.to_string(),
            gateway_transaction_id: Some(gateway_id.to_string()),
            gateway_response: None,
            idempotency_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn settled_notification_settles_pending_transaction() {
        let pending = pending_transaction("gw_77");
        let mut settled = pending.clone();
        settled.status = TransactionStatus::SettledPaid.to_string();
        let settled_id = settled.id;

        let mut mocks = Mocks::new();
        {
            let pending = pending.clone();
            mocks
                .transactions_lookup
                .expect_find_by_gateway_id()
                .with(eq("gw_77".to_string()))
                .times(1)
                .returning(move |_| Ok(Some(pending.clone())));
        }
        mocks
            .transactions_ledger
            .expect_transition_status()
            .with(
                eq(pending.id),
                eq(vec![TransactionStatus::Pending]),
                eq(TransactionStatus::SettledPaid),
                always(),
                always(),
            )
            .times(1)
            .returning(move |_, _, _, _, _| Ok(Some(settled.clone())));
        mocks
            .donors
            .expect_apply_settled_totals()
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        mocks.notifier.expect_notify_settled().times(1).return_const(());

        let result = mocks
            .into_reconciler()
            .process(json!({
                "transaction_id": "gw_77",
                "status_code": 101,
                "reason_code_id": 1000,
            }))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::TransactionSettled(settled_id));
    }

    #[tokio::test]
    async fn replayed_settlement_is_acknowledged_noop() {
        let pending = pending_transaction("gw_77");

        let mut mocks = Mocks::new();
        {
            let pending = pending.clone();
            mocks
                .transactions_lookup
                .expect_find_by_gateway_id()
                .times(1)
                .returning(move |_| Ok(Some(pending.clone())));
        }
        // The row already left Pending, so the conditional update misses.
        mocks
            .transactions_ledger
            .expect_transition_status()
            .times(1)
            .returning(|_, _, _, _, _| Ok(None));

        let result = mocks
            .into_reconciler()
            .process(json!({"transaction_id": "gw_77", "status_code": 101}))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::TransactionNoop);
    }

    #[tokio::test]
    async fn failure_notification_fails_pending_transaction() {
        let pending = pending_transaction("gw_88");
        let mut failed = pending.clone();
        failed.status = TransactionStatus::Failed.to_string();
        let failed_id = failed.id;

        let mut mocks = Mocks::new();
        {
            let pending = pending.clone();
            mocks
                .transactions_lookup
                .expect_find_by_gateway_id()
                .times(1)
                .returning(move |_| Ok(Some(pending.clone())));
        }
        mocks
            .transactions_ledger
            .expect_transition_status()
            .with(
                eq(pending.id),
                eq(vec![TransactionStatus::Pending]),
                eq(TransactionStatus::Failed),
                always(),
                always(),
            )
            .times(1)
            .returning(move |_, _, _, _, _| Ok(Some(failed.clone())));

        let result = mocks
            .into_reconciler()
            .process(json!({
                "transaction_id": "gw_88",
                "status_code": 301,
                "reason_code_id": 1520,
            }))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::TransactionFailed(failed_id));
    }

    #[tokio::test]
    async fn interim_pending_notification_changes_nothing() {
        let pending = pending_transaction("gw_99");

        let mut mocks = Mocks::new();
        {
            let pending = pending.clone();
            mocks
                .transactions_lookup
                .expect_find_by_gateway_id()
                .times(1)
                .returning(move |_| Ok(Some(pending.clone())));
        }
        // No transition_status expectation: any ledger call fails the test.

        let result = mocks
            .into_reconciler()
            .process(json!({"transaction_id": "gw_99", "status_code": 102}))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::TransactionNoop);
    }

    #[tokio::test]
    async fn payload_without_status_or_reason_changes_nothing() {
        let pending = pending_transaction("gw_blank");

        let mut mocks = Mocks::new();
        {
            let pending = pending.clone();
            mocks
                .transactions_lookup
                .expect_find_by_gateway_id()
                .times(1)
                .returning(move |_| Ok(Some(pending.clone())));
        }
        // No transition_status expectation: any ledger call fails the test.

        let result = mocks
            .into_reconciler()
            .process(json!({"transaction_id": "gw_blank"}))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::TransactionNoop);
    }

    #[tokio::test]
    async fn unknown_gateway_transaction_is_acknowledged() {
        let mut mocks = Mocks::new();
        mocks
            .transactions_lookup
            .expect_find_by_gateway_id()
            .times(1)
            .returning(|_| Ok(None));

        let result = mocks
            .into_reconciler()
            .process(json!({"transaction_id": "gw_missing", "status_code": 101}))
            .await
            .unwrap();

        assert_eq!(
            result,
            ReconcileResult::TransactionUnknown("gw_missing".to_string())
        );
    }

    #[tokio::test]
    async fn merchant_payload_with_credentials_activates_account() {
        let organization_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks
            .merchants
            .expect_activate()
            .with(
                eq(organization_id),
                eq("user_5".to_string()),
                eq(Some("key_5".to_string())),
                eq(Some("loc_5".to_string())),
                always(),
            )
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let result = mocks
            .into_reconciler()
            .process(json!({
                "client_app_id": organization_id.to_string(),
                "stage": "production",
                "users": [{
                    "user_id": "user_5",
                    "user_api_key": "key_5",
                    "location_id": "loc_5",
                }],
            }))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::MerchantActivated(organization_id));
    }

    #[tokio::test]
    async fn merchant_payload_without_users_only_stores_response() {
        let organization_id = Uuid::new_v4();

        let mut mocks = Mocks::new();
        mocks
            .merchants
            .expect_store_processor_response()
            .with(eq(organization_id), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let result = mocks
            .into_reconciler()
            .process(json!({
                "client_app_id": organization_id.to_string(),
                "stage": "underwriting",
                "users": [],
            }))
            .await
            .unwrap();

        assert_eq!(
            result,
            ReconcileResult::MerchantResponseStored(organization_id)
        );
    }

    #[tokio::test]
    async fn unrecognized_payload_is_persisted_and_ignored() {
        let mut mocks = Mocks::new();
        mocks.events = MockWebhookEventRepository::new();
        mocks
            .events
            .expect_append()
            .withf(|event| event.kind == "unknown")
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));

        let result = mocks
            .into_reconciler()
            .process(json!({"ping": true}))
            .await
            .unwrap();

        assert_eq!(result, ReconcileResult::Ignored);
    }
}
