//! HMAC-SHA256 webhook payload signatures

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body`
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::configuration(format!("Invalid webhook secret: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature against the body
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = compute_signature(secret, body) else {
        return false;
    };
    let signature = signature.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // RFC 4231 test case 2
        let signature = compute_signature("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_signature() {
        let body = br#"{"id":"msg_1"}"#;
        let signature = compute_signature("webhook-secret", body).unwrap();

        assert!(verify_signature("webhook-secret", body, &signature));
        assert!(verify_signature("webhook-secret", body, &signature.to_uppercase()));
        assert!(!verify_signature("other-secret", body, &signature));
        assert!(!verify_signature("webhook-secret", b"{}", &signature));
        assert!(!verify_signature("webhook-secret", body, "deadbeef"));
        assert!(!verify_signature("webhook-secret", body, ""));
    }
}
