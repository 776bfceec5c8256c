use anyhow::{Ok, Result};
use url::Url;

use super::config_model::{
    Billing, Database, DotEnvyConfig, Gateway, Notifications, Server, Webhooks,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let gateway = Gateway {
        base_url: std::env::var("GATEWAY_BASE_URL").expect("GATEWAY_BASE_URL is invalid"),
        developer_id: std::env::var("GATEWAY_DEVELOPER_ID")
            .expect("GATEWAY_DEVELOPER_ID is invalid"),
        user_id: std::env::var("GATEWAY_USER_ID").expect("GATEWAY_USER_ID is invalid"),
        user_api_key: std::env::var("GATEWAY_USER_API_KEY")
            .expect("GATEWAY_USER_API_KEY is invalid"),
        location_id: std::env::var("GATEWAY_LOCATION_ID").expect("GATEWAY_LOCATION_ID is invalid"),
        timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?,
    };

    let billing = Billing {
        cron_secret: std::env::var("BILLING_CRON_SECRET").expect("BILLING_CRON_SECRET is invalid"),
        fee_percentage: std::env::var("BILLING_FEE_PERCENTAGE")
            .unwrap_or_else(|_| "0.023".to_string())
            .parse()?,
        fee_fixed_minor: std::env::var("BILLING_FEE_FIXED_MINOR")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?,
        claim_stale_secs: std::env::var("BILLING_CLAIM_STALE_SECS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()?,
    };

    let webhooks = Webhooks {
        signing_secret: std::env::var("GATEWAY_WEBHOOK_SECRET")
            .expect("GATEWAY_WEBHOOK_SECRET is invalid"),
    };

    let notifications = Notifications {
        settlement_webhook_url: std::env::var("SETTLEMENT_WEBHOOK_URL")
            .ok()
            .map(|value| Url::parse(&value))
            .transpose()?,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        gateway,
        billing,
        webhooks,
        notifications,
    })
}
