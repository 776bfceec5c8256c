use std::sync::Arc;

use crate::application::usecases::transaction_ledger::TransactionLedger;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::value_objects::fees::FeeSchedule;
use crate::infrastructure::{
    notifier::SettlementWebhookNotifier,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{donors::DonorPostgres, transactions::TransactionPostgres},
    },
};

pub mod billing;
pub mod checkout;
pub mod gateway_webhooks;
pub mod transactions;

pub(crate) type PgTransactionLedger =
    TransactionLedger<TransactionPostgres, DonorPostgres, SettlementWebhookNotifier>;

pub(crate) fn build_ledger(
    config: &DotEnvyConfig,
    db_pool: &Arc<PgPoolSquad>,
) -> Arc<PgTransactionLedger> {
    let fee_schedule = FeeSchedule::new(
        config.billing.fee_percentage,
        config.billing.fee_fixed_minor,
    );

    Arc::new(TransactionLedger::new(
        Arc::new(TransactionPostgres::new(Arc::clone(db_pool))),
        Arc::new(DonorPostgres::new(Arc::clone(db_pool))),
        Arc::new(SettlementWebhookNotifier::new(
            config.notifications.settlement_webhook_url.clone(),
        )),
        fee_schedule,
    ))
}
