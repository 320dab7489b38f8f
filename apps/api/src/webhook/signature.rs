use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,

    #[error("signature is not valid hex")]
    Malformed,

    #[error("signature does not match body")]
    Mismatch,

    #[error("webhook secret cannot be used as an HMAC key")]
    Key,
}

/// Verifies a hex HMAC-SHA256 of the raw body, with or without a `sha256=`
/// prefix. The comparison is constant time.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;
    let provided = hex::decode(header.strip_prefix("sha256=").unwrap_or(header))
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Key)?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)
}

/// Constant-time equality for shared secrets sent as plain header values.
/// Both sides are MACed under `expected` and compared with `verify_slice`, so
/// timing reveals neither the length nor the content of the secret.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let mac_of = |value: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    match (mac_of(expected), mac_of(provided)) {
        (Ok(reference), Ok(candidate)) => candidate
            .verify_slice(&reference.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

/// Hex signature of `body`, as a scheduling provider would send it.
#[cfg(test)]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"event":"invitee.created"}"#;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("internal-token", "internal-token"));
        assert!(!secrets_match("internal-token", "internal-tokem"));
        assert!(!secrets_match("internal-token", "internal-token-longer"));
        assert!(!secrets_match("internal-token", ""));
    }

    fn flip_hex_digit(sig: &str, index: usize) -> String {
        let mut chars: Vec<char> = sig.chars().collect();
        chars[index] = if chars[index] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_valid_signature_with_and_without_prefix() {
        let sig = sign(SECRET, BODY);
        assert_eq!(verify_signature(SECRET, BODY, Some(&sig)), Ok(()));
        assert_eq!(
            verify_signature(SECRET, BODY, Some(&format!("sha256={sig}"))),
            Ok(())
        );
    }

    #[test]
    fn test_first_and_last_byte_mismatch_rejected() {
        let sig = sign(SECRET, BODY);
        let first = flip_hex_digit(&sig, 0);
        let last = flip_hex_digit(&sig, sig.len() - 1);
        assert_eq!(
            verify_signature(SECRET, BODY, Some(&first)),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, Some(&last)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let sig = sign(SECRET, BODY);
        assert_eq!(
            verify_signature(SECRET, BODY, Some(&sig[..sig.len() - 2])),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verify_signature(SECRET, BODY, None),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, Some("  ")),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, Some("sha256=not-hex")),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_wrong_secret_or_body_rejected() {
        let sig = sign(SECRET, BODY);
        assert_eq!(
            verify_signature("other", BODY, Some(&sig)),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_signature(SECRET, b"{}", Some(&sig)),
            Err(SignatureError::Mismatch)
        );
    }
}
