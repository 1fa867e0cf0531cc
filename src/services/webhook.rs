//! Webhook signature and payload validation.
//!
//! Inbound events are authenticated with HMAC-SHA256 over the raw payload
//! bytes, delivered in the `X-Hub-Signature-256` header as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header prefix for SHA-256 webhook signatures.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Keys every GitHub-style event payload must carry.
const REQUIRED_KEYS: &[&str] = &["action", "repository", "sender"];

/// Validates inbound webhook deliveries against a shared secret.
///
/// The secret is injected at construction; there is no global state.
#[derive(Clone)]
pub struct WebhookValidator {
    secret: Vec<u8>,
}

impl WebhookValidator {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify the signature header against the raw payload bytes.
    ///
    /// Returns `false` without computing any HMAC when the header is missing
    /// the `sha256=` prefix or is not valid hex. The comparison itself is
    /// constant-time (`Mac::verify_slice`), so a mismatch reveals nothing
    /// about how many bytes matched.
    #[must_use]
    pub fn verify_signature(&self, payload: &[u8], header: &str) -> bool {
        let Some(hex_signature) = header.strip_prefix(SIGNATURE_PREFIX) else {
            return false;
        };
        let Ok(signature) = hex::decode(hex_signature) else {
            return false;
        };

        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        mac.verify_slice(&signature).is_ok()
    }

    /// Check that a parsed payload has the shape of a GitHub-style event.
    ///
    /// Absent keys are a rejection, never a panic.
    #[must_use]
    pub fn validate_payload_shape(payload: &Value) -> bool {
        let Some(object) = payload.as_object() else {
            return false;
        };
        REQUIRED_KEYS.iter().all(|key| object.contains_key(*key))
    }

    /// Compute the signature header value for a payload. Test and client
    /// helper; the validator itself only ever verifies.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload);
        format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_signature_accepted() {
        let validator = WebhookValidator::new(b"shared-secret".to_vec());
        let payload = br#"{"action":"opened"}"#;
        let header = validator.sign(payload);
        assert!(validator.verify_signature(payload, &header));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let validator = WebhookValidator::new(b"shared-secret".to_vec());
        let header = validator.sign(br#"{"action":"opened"}"#);
        assert!(!validator.verify_signature(br#"{"action":"closed"}"#, &header));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = WebhookValidator::new(b"secret-a".to_vec());
        let verifier = WebhookValidator::new(b"secret-b".to_vec());
        let payload = b"payload";
        let header = signer.sign(payload);
        assert!(!verifier.verify_signature(payload, &header));
    }

    #[test]
    fn test_missing_prefix_rejected_without_panic() {
        let validator = WebhookValidator::new(b"secret".to_vec());
        assert!(!validator.verify_signature(b"payload", "deadbeef"));
        assert!(!validator.verify_signature(b"payload", "sha1=deadbeef"));
        assert!(!validator.verify_signature(b"payload", ""));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        let validator = WebhookValidator::new(b"secret".to_vec());
        assert!(!validator.verify_signature(b"payload", "sha256=not-hex!"));
    }

    #[test]
    fn test_payload_shape() {
        let good = json!({
            "action": "opened",
            "repository": {"full_name": "octocat/hello-world"},
            "sender": {"login": "octocat"},
        });
        assert!(WebhookValidator::validate_payload_shape(&good));

        let missing_sender = json!({
            "action": "opened",
            "repository": {},
        });
        assert!(!WebhookValidator::validate_payload_shape(&missing_sender));

        assert!(!WebhookValidator::validate_payload_shape(&json!([1, 2])));
        assert!(!WebhookValidator::validate_payload_shape(&json!(null)));
    }
}
