//! HMAC-SHA256 signature verification for gateway callbacks.
//!
//! Client-side verify signs `"{order_id}|{payment_id}"` with the key secret;
//! webhooks sign the raw request body with the webhook secret. Both arrive
//! hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of a message.
pub fn sign(secret: &str, message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a hex-encoded HMAC-SHA256 signature.
pub fn verify(secret: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// Verify the client-side payment signature over `"{order_id}|{payment_id}"`.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature_hex: &str,
) -> bool {
    let message = format!("{order_id}|{payment_id}");
    verify(secret, message.as_bytes(), signature_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let sig = sign("key_secret", b"order_x|pay_y");
        assert!(verify("key_secret", b"order_x|pay_y", &sig));
    }

    #[test]
    fn tampered_message_is_rejected() {
        let sig = sign("key_secret", b"order_x|pay_y");
        assert!(!verify("key_secret", b"order_x|pay_z", &sig));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let sig = sign("key_secret", b"order_x|pay_y");
        assert!(!verify("other_secret", b"order_x|pay_y", &sig));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        assert!(!verify("key_secret", b"msg", "not-hex!"));
        assert!(!verify("key_secret", b"msg", ""));
    }

    #[test]
    fn payment_signature_uses_pipe_separator() {
        let sig = sign("secret", b"order_ABC|pay_DEF");
        assert!(verify_payment_signature("secret", "order_ABC", "pay_DEF", &sig));
        assert!(!verify_payment_signature("secret", "order_ABC", "pay_XYZ", &sig));
    }

    #[test]
    fn webhook_body_signature() {
        let body = br#"{"event":"payment.captured","payload":{}}"#;
        let sig = sign("webhook_secret", body);
        assert!(verify("webhook_secret", body, &sig));
        // A single flipped byte invalidates the signature.
        let tampered = br#"{"event":"payment.captured","payload":{ }}"#;
        assert!(!verify("webhook_secret", tampered, &sig));
    }
}
