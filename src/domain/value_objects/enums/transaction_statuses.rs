use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single charge attempt. Transitions only move forward
/// through the ledger's state machine; `Failed` and `Refunded` are terminal.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    #[default]
    New,
    SettledPaid,
    Pending,
    Failed,
    Refunded,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            TransactionStatus::New => "new",
            TransactionStatus::SettledPaid => "settled_paid",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        };
        write!(f, "{}", status)
    }
}

impl TransactionStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "new" => Some(TransactionStatus::New),
            "settled_paid" => Some(TransactionStatus::SettledPaid),
            "pending" => Some(TransactionStatus::Pending),
            "failed" => Some(TransactionStatus::Failed),
            "refunded" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}
