pub mod billing_scheduler;
pub mod checkout;
pub mod gateway;
pub mod refunds;
pub mod transaction_ledger;
pub mod webhook_reconciler;
