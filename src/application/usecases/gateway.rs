use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    enums::payment_channels::PaymentChannel, gateway_outcomes::Outcome,
};

/// What a hosted payment form needs a client token for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizationIntent {
    pub channel: PaymentChannel,
    /// Sale amount for immediate charges; absent when only storing a method.
    pub amount_minor: Option<i64>,
}

/// Port to the remote payment processor. Every charge carries a
/// caller-supplied idempotency reference; the gateway dedupes on it, so an
/// HTTP-level retry cannot produce a second charge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge_card(
        &self,
        token: &str,
        amount_minor: i64,
        idempotency_ref: &str,
    ) -> Result<Outcome>;

    async fn charge_bank(
        &self,
        token: &str,
        amount_minor: i64,
        idempotency_ref: &str,
    ) -> Result<Outcome>;

    async fn refund(&self, gateway_transaction_id: &str, amount_minor: i64) -> Result<Outcome>;

    /// Client token for the gateway's hosted tokenization form.
    async fn tokenize(&self, intent: TokenizationIntent) -> Result<String>;
}
