use serde_json::json;
use tracing::warn;
use url::Url;

use crate::application::usecases::transaction_ledger::{
    SettlementNotification, SettlementNotifier,
};

/// Fire-and-forget settlement notifications to an optional outbound webhook.
/// Delivery runs on a spawned task; failures are logged and dropped, never
/// propagated back into the ledger.
pub struct SettlementWebhookNotifier {
    http: reqwest::Client,
    webhook_url: Option<Url>,
}

impl SettlementWebhookNotifier {
    pub fn new(webhook_url: Option<Url>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }
}

impl SettlementNotifier for SettlementWebhookNotifier {
    fn notify_settled(&self, notification: SettlementNotification) {
        let Some(url) = self.webhook_url.clone() else {
            return;
        };

        let http = self.http.clone();
        let body = json!({
            "event": "transaction.settled",
            "transaction_id": notification.transaction_id,
            "organization_id": notification.organization_id,
            "donor_id": notification.donor_id,
            "amount_minor": notification.amount_minor,
            "channel": notification.channel,
        });

        tokio::spawn(async move {
            if let Err(err) = http.post(url).json(&body).send().await {
                warn!(
                    transaction_id = %notification.transaction_id,
                    error = %err,
                    "settlement notification delivery failed"
                );
            }
        });
    }
}
