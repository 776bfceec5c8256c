use rust_decimal::Decimal;
use url::Url;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub gateway: Gateway,
    pub billing: Billing,
    pub webhooks: Webhooks,
    pub notifications: Notifications,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Gateway {
    pub base_url: String,
    pub developer_id: String,
    pub user_id: String,
    pub user_api_key: String,
    pub location_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Billing {
    pub cron_secret: String,
    pub fee_percentage: Decimal,
    pub fee_fixed_minor: i64,
    pub claim_stale_secs: i64,
}

#[derive(Debug, Clone)]
pub struct Webhooks {
    pub signing_secret: String,
}

#[derive(Debug, Clone)]
pub struct Notifications {
    pub settlement_webhook_url: Option<Url>,
}
