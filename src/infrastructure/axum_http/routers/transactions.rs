use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use uuid::Uuid;

use crate::application::usecases::refunds::{RefundError, Refunds};
use crate::config::config_model::DotEnvyConfig;
use crate::domain::entities::transactions::TransactionEntity;
use crate::infrastructure::{
    axum_http::error_responses::AppError,
    axum_http::routers::build_ledger,
    gateway::http_client::GatewayHttpClient,
    notifier::SettlementWebhookNotifier,
    postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{donors::DonorPostgres, transactions::TransactionPostgres},
    },
};

type PgRefunds = Refunds<
    GatewayHttpClient,
    TransactionPostgres,
    DonorPostgres,
    SettlementWebhookNotifier,
>;

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub status: String,
    pub channel: String,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub net_minor: i64,
    pub gateway_transaction_id: Option<String>,
}

impl From<TransactionEntity> for TransactionResponse {
    fn from(entity: TransactionEntity) -> Self {
        Self {
            id: entity.id,
            status: entity.status,
            channel: entity.channel,
            amount_minor: entity.amount_minor,
            fee_minor: entity.fee_minor,
            net_minor: entity.net_minor,
            gateway_transaction_id: entity.gateway_transaction_id,
        }
    }
}

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<Router> {
    let ledger = build_ledger(&config, &db_pool);
    let gateway = Arc::new(GatewayHttpClient::new(&config.gateway)?);

    let refunds = Arc::new(Refunds::new(
        gateway,
        Arc::new(TransactionPostgres::new(Arc::clone(&db_pool))),
        ledger,
    ));

    Ok(Router::new()
        .route("/:transaction_id/refund", post(refund))
        .with_state(refunds))
}

async fn refund(
    State(refunds): State<Arc<PgRefunds>>,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let refunded = refunds
        .refund(transaction_id)
        .await
        .map_err(|err| match err {
            RefundError::TransactionNotFound(id) => {
                AppError::NotFound(format!("transaction {id} not found"))
            }
            RefundError::NotRefundable { .. } | RefundError::MissingGatewayReference(_) => {
                AppError::Unprocessable(err.to_string())
            }
            RefundError::GatewayRejected(message) => AppError::Unprocessable(message),
            RefundError::Internal(inner) => AppError::Internal(inner),
        })?;

    Ok(Json(TransactionResponse::from(refunded)))
}
