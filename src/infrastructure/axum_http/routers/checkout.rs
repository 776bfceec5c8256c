use std::sync::Arc;

use anyhow::Result;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::usecases::{
    checkout::{Checkout, CheckoutError, OneTimeCharge},
    gateway::TokenizationIntent,
    transaction_ledger::LedgerError,
};
use crate::config::config_model::DotEnvyConfig;
use crate::infrastructure::{
    axum_http::error_responses::AppError,
    axum_http::routers::{build_ledger, transactions::TransactionResponse},
    gateway::http_client::GatewayHttpClient,
    notifier::SettlementWebhookNotifier,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            donors::DonorPostgres, merchant_accounts::MerchantAccountPostgres,
            sources::SourcePostgres, transactions::TransactionPostgres,
        },
    },
};

type PgCheckout = Checkout<
    SourcePostgres,
    MerchantAccountPostgres,
    GatewayHttpClient,
    TransactionPostgres,
    DonorPostgres,
    SettlementWebhookNotifier,
>;

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub source_id: Uuid,
    pub amount_minor: i64,
}

#[derive(Debug, Serialize)]
pub struct IntentionResponse {
    pub client_token: String,
}

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<Router> {
    let ledger = build_ledger(&config, &db_pool);
    let gateway = Arc::new(GatewayHttpClient::new(&config.gateway)?);

    let checkout = Arc::new(Checkout::new(
        Arc::new(SourcePostgres::new(Arc::clone(&db_pool))),
        Arc::new(MerchantAccountPostgres::new(Arc::clone(&db_pool))),
        gateway,
        ledger,
    ));

    Ok(Router::new()
        .route("/process-payment", post(process_payment))
        .route("/intention", post(intention))
        .with_state(checkout))
}

async fn process_payment(
    State(checkout): State<Arc<PgCheckout>>,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = checkout
        .charge(OneTimeCharge {
            organization_id: request.organization_id,
            donor_id: request.donor_id,
            source_id: request.source_id,
            amount_minor: request.amount_minor,
        })
        .await
        .map_err(map_checkout_error)?;

    Ok(Json(TransactionResponse::from(transaction)))
}

async fn intention(
    State(checkout): State<Arc<PgCheckout>>,
    Json(intent): Json<TokenizationIntent>,
) -> Result<impl IntoResponse, AppError> {
    let client_token = checkout
        .tokenization_token(intent)
        .await
        .map_err(map_checkout_error)?;

    Ok(Json(IntentionResponse { client_token }))
}

fn map_checkout_error(err: CheckoutError) -> AppError {
    match err {
        CheckoutError::SourceUnavailable(_) | CheckoutError::MerchantNotActive(_) => {
            AppError::BadRequest(err.to_string())
        }
        CheckoutError::Declined { reason, .. } => AppError::Unprocessable(reason),
        CheckoutError::GatewayUnavailable { message, .. } => AppError::BadGateway(message),
        CheckoutError::Ledger(LedgerError::InvalidAmount(amount)) => {
            AppError::BadRequest(format!("charge amount must be positive, got {amount}"))
        }
        CheckoutError::Ledger(inner) => AppError::Internal(inner.into()),
        CheckoutError::Internal(inner) => AppError::Internal(inner),
    }
}
