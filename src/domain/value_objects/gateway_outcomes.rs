use serde::Deserialize;
use serde_json::Value;

use super::enums::payment_channels::PaymentChannel;

/// Gateway status code for an approved, settled transaction.
pub const STATUS_APPROVED: i32 = 101;
/// Gateway status code for a transaction accepted but awaiting clearance.
pub const STATUS_PENDING: i32 = 102;
/// Gateway reason code paired with either status on success.
pub const REASON_SUCCESS: i32 = 1000;

/// Strict schema for the gateway's transaction envelope. The gateway always
/// returns these fields under a top-level `data` key; anything it sends
/// beyond them is kept only in the raw payload stored on the ledger row.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayTransactionResponse {
    pub id: Option<String>,
    pub status_code: Option<i32>,
    pub reason_code_id: Option<i32>,
    pub reason_code_text: Option<String>,
}

/// Whether a gateway-side failure is worth retrying on a later cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network failure or timeout. Retryable on the next cycle, never within
    /// the same one.
    Transient,
    /// The gateway rejected the request shape. Retrying the same request
    /// cannot succeed; this should alert rather than just count.
    Permanent,
}

/// Canonical result of a charge or refund call, normalized from the
/// gateway's status/reason code pairs.
#[derive(Debug, Clone)]
pub enum Outcome {
    Approved {
        gateway_tx_id: String,
        raw: Value,
    },
    PendingSettlement {
        gateway_tx_id: String,
        raw: Value,
    },
    Declined {
        reason_code: Option<i32>,
        reason_text: String,
        raw: Value,
    },
    GatewayError {
        kind: GatewayErrorKind,
        message: String,
    },
}

impl Outcome {
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Outcome::Approved { raw, .. }
            | Outcome::PendingSettlement { raw, .. }
            | Outcome::Declined { raw, .. } => Some(raw),
            Outcome::GatewayError { .. } => None,
        }
    }
}

/// Classifies a parsed gateway response for the given channel.
///
/// The documented pairs are strict: 101/1000 is approved, 102/1000 on the
/// bank channel is accepted-pending-clearance. A response that carries a
/// transaction id and the success reason code but an unrecognized status
/// code falls back to approved-equivalent; that permissive rule is kept from
/// the gateway's observed behavior and lives only here so it can be
/// tightened without touching call sites. Everything else is a decline.
pub fn classify_response(
    channel: PaymentChannel,
    response: &GatewayTransactionResponse,
    raw: Value,
) -> Outcome {
    let status = response.status_code;
    let reason = response.reason_code_id;

    if reason == Some(REASON_SUCCESS) {
        if let Some(id) = response.id.as_deref() {
            if channel == PaymentChannel::Bank && status == Some(STATUS_PENDING) {
                return Outcome::PendingSettlement {
                    gateway_tx_id: id.to_string(),
                    raw,
                };
            }
            // 101 or the permissive fallback: success reason + transaction id.
            return Outcome::Approved {
                gateway_tx_id: id.to_string(),
                raw,
            };
        }
    }

    // Bank debits sometimes come back with an id and no reason code at all
    // while the gateway queues them for clearance.
    if channel == PaymentChannel::Bank && reason.is_none() {
        if let Some(id) = response.id.as_deref() {
            return Outcome::PendingSettlement {
                gateway_tx_id: id.to_string(),
                raw,
            };
        }
    }

    Outcome::Declined {
        reason_code: reason,
        reason_text: response
            .reason_code_text
            .clone()
            .unwrap_or_else(|| "declined by gateway".to_string()),
        raw,
    }
}
