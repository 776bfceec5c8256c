use serde::Deserialize;
use serde_json::Value;

/// Inbound gateway notifications share one URL; the payload shape decides
/// the family. Merchant onboarding payloads carry `client_app_id` plus a
/// `users` array, transaction updates carry `transaction_id` (or `id`).
#[derive(Debug)]
pub enum GatewayWebhook {
    TransactionStatus(TransactionStatusEvent),
    MerchantStatus(MerchantStatusEvent),
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusEvent {
    #[serde(alias = "transaction_id")]
    pub id: String,
    pub status_code: Option<i32>,
    pub reason_code_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantStatusEvent {
    pub client_app_id: String,
    pub stage: Option<String>,
    #[serde(default)]
    pub users: Vec<MerchantUser>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub locations: Vec<MerchantLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantUser {
    pub user_id: String,
    pub user_api_key: Option<String>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub locations: Vec<MerchantLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantLocation {
    pub id: String,
}

impl MerchantStatusEvent {
    /// The location id can appear in several places depending on the
    /// gateway's onboarding path; first match wins.
    pub fn resolve_location_id(&self) -> Option<String> {
        let user = self.users.first();

        user.and_then(|u| u.location_id.clone())
            .or_else(|| user.and_then(|u| u.locations.first().map(|l| l.id.clone())))
            .or_else(|| self.location_id.clone())
            .or_else(|| self.locations.first().map(|l| l.id.clone()))
    }
}

/// Routes a verbatim payload to its notification family.
pub fn route_payload(payload: &Value) -> GatewayWebhook {
    let object = match payload.as_object() {
        Some(object) => object,
        None => return GatewayWebhook::Unknown,
    };

    if object.contains_key("client_app_id") && object.contains_key("users") {
        return match serde_json::from_value(payload.clone()) {
            Ok(event) => GatewayWebhook::MerchantStatus(event),
            Err(_) => GatewayWebhook::Unknown,
        };
    }

    if object.contains_key("transaction_id") || object.contains_key("id") {
        return match serde_json::from_value(payload.clone()) {
            Ok(event) => GatewayWebhook::TransactionStatus(event),
            Err(_) => GatewayWebhook::Unknown,
        };
    }

    GatewayWebhook::Unknown
}
