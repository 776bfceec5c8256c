pub mod donors;
pub mod merchant_accounts;
pub mod sources;
pub mod subscriptions;
pub mod transactions;
pub mod webhook_events;
