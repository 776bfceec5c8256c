use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    response::IntoResponse,
    routing::post,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::usecases::billing_scheduler::SubscriptionBillingScheduler;
use crate::config::config_model::DotEnvyConfig;
use crate::infrastructure::{
    axum_http::error_responses::AppError,
    axum_http::routers::{PgTransactionLedger, build_ledger},
    gateway::http_client::GatewayHttpClient,
    notifier::SettlementWebhookNotifier,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            donors::DonorPostgres, merchant_accounts::MerchantAccountPostgres,
            sources::SourcePostgres, subscriptions::SubscriptionPostgres,
            transactions::TransactionPostgres,
        },
    },
};

type PgBillingScheduler = SubscriptionBillingScheduler<
    SubscriptionPostgres,
    SourcePostgres,
    MerchantAccountPostgres,
    GatewayHttpClient,
    TransactionPostgres,
    DonorPostgres,
    SettlementWebhookNotifier,
>;

struct BillingState {
    scheduler: PgBillingScheduler,
    cron_secret: String,
}

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<Router> {
    let ledger: Arc<PgTransactionLedger> = build_ledger(&config, &db_pool);
    let gateway = Arc::new(GatewayHttpClient::new(&config.gateway)?);
    let worker_id = format!("billing-{}", Uuid::new_v4());

    let scheduler = SubscriptionBillingScheduler::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SourcePostgres::new(Arc::clone(&db_pool))),
        Arc::new(MerchantAccountPostgres::new(Arc::clone(&db_pool))),
        gateway,
        ledger,
        worker_id,
        Duration::seconds(config.billing.claim_stale_secs),
    );

    let state = Arc::new(BillingState {
        scheduler,
        cron_secret: config.billing.cron_secret.clone(),
    });

    Ok(Router::new().route("/run", post(run)).with_state(state))
}

async fn run(
    State(state): State<Arc<BillingState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.cron_secret);
    if !authorized {
        return Err(AppError::Unauthorized);
    }

    let report = state.scheduler.run(Utc::now()).await?;
    Ok(Json(report))
}
