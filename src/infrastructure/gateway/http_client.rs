use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;
use url::Url;

use crate::application::usecases::gateway::{PaymentGateway, TokenizationIntent};
use crate::config::config_model::Gateway;
use crate::domain::value_objects::{
    enums::payment_channels::PaymentChannel,
    gateway_outcomes::{GatewayErrorKind, GatewayTransactionResponse, Outcome, classify_response},
};

/// Minimal processor client built on reqwest. Credentials ride as headers on
/// every request; charges carry the caller's idempotency reference in a
/// custom field so the processor dedupes retried submissions.
pub struct GatewayHttpClient {
    http: reqwest::Client,
    base_url: Url,
    developer_id: String,
    user_id: String,
    user_api_key: String,
    location_id: String,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    data: GatewayTransactionResponse,
}

#[derive(Debug, Deserialize)]
struct IntentionEnvelope {
    data: IntentionData,
}

#[derive(Debug, Deserialize)]
struct IntentionData {
    client_token: String,
}

impl GatewayHttpClient {
    pub fn new(config: &Gateway) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            developer_id: config.developer_id.clone(),
            user_id: config.user_id.clone(),
            user_api_key: config.user_api_key.clone(),
            location_id: config.location_id.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("developer-id", &self.developer_id)
            .header("user-id", &self.user_id)
            .header("user-api-key", &self.user_api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Sends a transaction call and folds every transport or HTTP failure
    /// into `Outcome::GatewayError` so callers apply one failure policy.
    async fn execute_transaction(
        &self,
        method: Method,
        path: &str,
        body: Value,
        channel: PaymentChannel,
    ) -> Result<Outcome> {
        let url = self.endpoint(path)?;

        let response = match self.request(method, url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = if err.is_timeout() || err.is_connect() {
                    GatewayErrorKind::Transient
                } else {
                    GatewayErrorKind::Permanent
                };
                error!(path, error = %err, "gateway request failed to send");
                return Ok(Outcome::GatewayError {
                    kind,
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        let raw: Value = match response.json().await {
            Ok(raw) => raw,
            Err(err) => {
                error!(path, status = %status, error = %err, "gateway response body unreadable");
                return Ok(Outcome::GatewayError {
                    kind: GatewayErrorKind::Transient,
                    message: format!("unreadable gateway response: {err}"),
                });
            }
        };

        if !status.is_success() {
            let kind = if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                GatewayErrorKind::Transient
            } else {
                GatewayErrorKind::Permanent
            };
            error!(path, status = %status, body = %raw, "gateway returned error status");
            return Ok(Outcome::GatewayError {
                kind,
                message: format!("gateway returned status {status}"),
            });
        }

        let envelope: TransactionEnvelope = match serde_json::from_value(raw.clone()) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(path, body = %raw, error = %err, "gateway response missing data envelope");
                return Ok(Outcome::GatewayError {
                    kind: GatewayErrorKind::Permanent,
                    message: format!("malformed gateway response: {err}"),
                });
            }
        };

        Ok(classify_response(channel, &envelope.data, raw))
    }
}

#[async_trait]
impl PaymentGateway for GatewayHttpClient {
    async fn charge_card(
        &self,
        token: &str,
        amount_minor: i64,
        idempotency_ref: &str,
    ) -> Result<Outcome> {
        let body = json!({
            "transaction_amount": amount_minor,
            "token_id": token,
            "transaction_c1": idempotency_ref,
        });

        self.execute_transaction(
            Method::POST,
            "v1/transactions/cc/sale/token",
            body,
            PaymentChannel::Card,
        )
        .await
    }

    async fn charge_bank(
        &self,
        token: &str,
        amount_minor: i64,
        idempotency_ref: &str,
    ) -> Result<Outcome> {
        let body = json!({
            "transaction_amount": amount_minor,
            "token_id": token,
            "transaction_c1": idempotency_ref,
        });

        self.execute_transaction(
            Method::POST,
            "v1/transactions/ach/debit/token",
            body,
            PaymentChannel::Bank,
        )
        .await
    }

    async fn refund(&self, gateway_transaction_id: &str, amount_minor: i64) -> Result<Outcome> {
        let body = json!({ "transaction_amount": amount_minor });
        let path = format!("v1/transactions/{gateway_transaction_id}/refund");

        // Refunds resolve synchronously on the card rails either way.
        self.execute_transaction(Method::PATCH, &path, body, PaymentChannel::Card)
            .await
    }

    async fn tokenize(&self, intent: TokenizationIntent) -> Result<String> {
        let mut body = json!({
            "location_id": self.location_id,
            "action": if intent.amount_minor.is_some() { "sale" } else { "avsonly" },
        });
        if let Some(amount_minor) = intent.amount_minor {
            body["amount"] = json!(amount_minor);
        }

        let url = self.endpoint("v1/elements/transaction/intention")?;
        let response = self.request(Method::POST, url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "tokenization intention failed");
            anyhow::bail!("gateway rejected tokenization intention with status {status}");
        }

        let envelope: IntentionEnvelope = response.json().await?;
        Ok(envelope.data.client_token)
    }
}
