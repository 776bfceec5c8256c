use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::warn;

use crate::application::usecases::webhook_reconciler::WebhookReconciler;
use crate::config::config_model::DotEnvyConfig;
use crate::infrastructure::{
    axum_http::error_responses::AppError,
    axum_http::routers::build_ledger,
    gateway::webhook_signatures::verify_webhook_signature,
    notifier::SettlementWebhookNotifier,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            donors::DonorPostgres, merchant_accounts::MerchantAccountPostgres,
            transactions::TransactionPostgres, webhook_events::WebhookEventPostgres,
        },
    },
};

const SIGNATURE_HEADER: &str = "x-gateway-signature";

type PgWebhookReconciler = WebhookReconciler<
    WebhookEventPostgres,
    TransactionPostgres,
    DonorPostgres,
    SettlementWebhookNotifier,
    MerchantAccountPostgres,
>;

struct WebhookState {
    reconciler: PgWebhookReconciler,
    signing_secret: String,
}

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<Router> {
    let ledger = build_ledger(&config, &db_pool);

    let reconciler = WebhookReconciler::new(
        Arc::new(WebhookEventPostgres::new(Arc::clone(&db_pool))),
        Arc::new(TransactionPostgres::new(Arc::clone(&db_pool))),
        ledger,
        Arc::new(MerchantAccountPostgres::new(Arc::clone(&db_pool))),
    );

    let state = Arc::new(WebhookState {
        reconciler,
        signing_secret: config.webhooks.signing_secret.clone(),
    });

    Ok(Router::new().route("/", post(receive)).with_state(state))
}

async fn receive(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if let Err(err) = verify_webhook_signature(&state.signing_secret, &body, signature) {
        warn!(error = %err, "webhook: signature verification failed");
        return Err(AppError::Unauthorized);
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("invalid JSON payload: {err}")))?;

    let result = state.reconciler.process(payload).await?;

    Ok(Json(json!({
        "received": true,
        "result": format!("{result:?}"),
    })))
}
