use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Card sales settle synchronously; bank debits are only final after the
/// gateway's clearance webhook arrives.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentChannel {
    #[default]
    Card,
    Bank,
}

impl Display for PaymentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channel = match self {
            PaymentChannel::Card => "card",
            PaymentChannel::Bank => "bank",
        };
        write!(f, "{}", channel)
    }
}

impl PaymentChannel {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "card" => Some(PaymentChannel::Card),
            "bank" => Some(PaymentChannel::Bank),
            _ => None,
        }
    }
}
