pub mod frequencies;
pub mod payment_channels;
pub mod subscription_statuses;
pub mod transaction_statuses;
