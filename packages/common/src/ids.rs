//! Human-readable identifier generation.
//!
//! Formats: `TXN-YYYYMMDD-<8HEX>` for payment transactions,
//! `REF-YYYYMMDD-<8HEX>` for refunds, `BKG-YYYYMMDD-<8HEX>` for booking
//! numbers. The hex suffix is random; uniqueness is enforced by the unique
//! column the identifier lands in.

use chrono::Utc;
use rand::Rng;

fn random_hex(len: usize) -> String {
    const HEX: &[u8] = b"0123456789ABCDEF";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
        .collect()
}

fn dated_id(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().format("%Y%m%d"),
        random_hex(8)
    )
}

/// Internal transaction id for a payment: `TXN-YYYYMMDD-<8HEX>`.
pub fn transaction_id() -> String {
    dated_id("TXN")
}

/// Refund id: `REF-YYYYMMDD-<8HEX>`.
pub fn refund_id() -> String {
    dated_id("REF")
}

/// Booking number: `BKG-YYYYMMDD-<8HEX>`.
pub fn booking_number() -> String {
    dated_id("BKG")
}

/// Per-entity QR secret: 64 lowercase hex characters. The first 32 characters
/// double as the upload token handed out after QR verification.
pub fn qr_secret() -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut rng = rand::rng();
    (0..64)
        .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_dated_format(id: &str, prefix: &str) {
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3, "bad shape: {id}");
        assert_eq!(parts[0], prefix);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn transaction_id_format() {
        assert_dated_format(&transaction_id(), "TXN");
    }

    #[test]
    fn refund_id_format() {
        assert_dated_format(&refund_id(), "REF");
    }

    #[test]
    fn booking_number_format() {
        assert_dated_format(&booking_number(), "BKG");
    }

    #[test]
    fn ids_are_not_repeated() {
        let a = transaction_id();
        let b = transaction_id();
        assert_ne!(a, b);
    }

    #[test]
    fn qr_secret_is_64_lower_hex() {
        let secret = qr_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(secret, secret.to_lowercase());
    }
}
