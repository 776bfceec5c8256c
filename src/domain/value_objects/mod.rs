pub mod billing_reports;
pub mod enums;
pub mod fees;
pub mod gateway_outcomes;
pub mod gateway_webhooks;
