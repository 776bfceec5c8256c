use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the HMAC-SHA256 hex signature the gateway sends with each
/// webhook delivery. The signature covers the raw request body, so callers
/// must verify before any JSON parsing.
pub fn verify_webhook_signature(secret: &str, payload: &[u8], signature_hex: &str) -> Result<()> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    let expected = mac.finalize().into_bytes();
    let provided = hex::decode(signature_hex.trim())?;

    if expected[..] != provided[..] {
        anyhow::bail!("invalid webhook signature");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_matching_signature() {
        let payload = br#"{"transaction_id":"gw_1","status_code":101}"#;
        let signature = sign("whsec_test", payload);
        assert!(verify_webhook_signature("whsec_test", payload, &signature).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let signature = sign("whsec_test", b"original body");
        assert!(verify_webhook_signature("whsec_test", b"tampered body", &signature).is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"payload";
        let signature = sign("whsec_other", payload);
        assert!(verify_webhook_signature("whsec_test", payload, &signature).is_err());
    }

    #[test]
    fn rejects_garbage_signature() {
        assert!(verify_webhook_signature("whsec_test", b"payload", "not-hex").is_err());
    }
}
