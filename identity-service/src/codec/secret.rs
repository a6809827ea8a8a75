//! Bearer secret text form: `<prefix><55 base36 symbols>`.
//!
//! The prefix is per kind (and per tenant for API keys) so leaked-secret
//! scanners can recognise a tenant's tokens by pattern.

use super::{alphabet, decode_body, split_body, CodecError};

/// Raw secret length in bytes (280 bits).
pub const SECRET_LEN: usize = 35;

/// `ceil(280 / log2(36))`.
pub const SECRET_WIDTH: usize = 55;

pub type SecretBytes = [u8; SECRET_LEN];

const WHAT: &str = "secret";

/// Prefixes are restricted so every encoded secret is a flat `[a-z0-9_]+`
/// token, distinguishable from three-segment compact tokens.
pub fn validate_prefix(prefix: &str) -> Result<(), CodecError> {
    let valid = !prefix.is_empty()
        && prefix
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(CodecError::InvalidPrefix(prefix.to_string()))
    }
}

/// Total text length of a secret carrying `prefix`.
pub fn encoded_len(prefix: &str) -> usize {
    prefix.len() + SECRET_WIDTH
}

pub fn format(prefix: &str, secret: &SecretBytes) -> String {
    let mut out = String::with_capacity(encoded_len(prefix));
    out.push_str(prefix);
    out.push_str(&alphabet::encode_fixed(secret, SECRET_WIDTH));
    out
}

pub fn parse(prefix: &str, text: &str) -> Result<SecretBytes, CodecError> {
    let body = split_body(WHAT, prefix, SECRET_WIDTH, text)?;
    decode_body::<SECRET_LEN>(WHAT, prefix, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_zero_secret_round_trip() {
        let zero = [0u8; SECRET_LEN];
        let text = format("apikey_", &zero);
        assert_eq!(text, format!("apikey_{}", "0".repeat(SECRET_WIDTH)));
        assert_eq!(parse("apikey_", &text), Ok(zero));
    }

    #[test]
    fn test_all_ff_secret_round_trip() {
        let max = [0xffu8; SECRET_LEN];
        let text = format("apikey_", &max);
        assert_eq!(
            text,
            "apikey_1rqebqrqf0vfcdz5pu5fquov5813iobr29qjm1mf1lrufy1ifr3y8sf"
        );
        assert_eq!(parse("apikey_", &text), Ok(max));
    }

    #[test]
    fn test_random_secrets_round_trip() {
        let mut rng = rand::thread_rng();
        for prefix in ["apikey_", "acme_live_", "scim_apikey_", "x"] {
            for _ in 0..64 {
                let mut secret = [0u8; SECRET_LEN];
                rng.fill_bytes(&mut secret);
                let text = format(prefix, &secret);
                assert_eq!(text.len(), encoded_len(prefix));
                assert_eq!(parse(prefix, &text), Ok(secret));
            }
        }
    }

    #[test]
    fn test_single_bit_secrets_round_trip() {
        for byte in 0..SECRET_LEN {
            for bit in 0..8 {
                let mut secret = [0u8; SECRET_LEN];
                secret[byte] = 1 << bit;
                assert_eq!(parse("k_", &format("k_", &secret)), Ok(secret));
            }
        }
    }

    #[test]
    fn test_prefix_mismatch() {
        let text = format("apikey_", &[7u8; SECRET_LEN]);
        assert_eq!(
            parse("backend_apikey_", &text),
            Err(CodecError::PrefixMismatch {
                what: "secret",
                expected: "backend_apikey_".to_string()
            })
        );
    }

    #[test]
    fn test_wrong_length() {
        let text = format("apikey_", &[7u8; SECRET_LEN]);
        assert_eq!(
            parse("apikey_", &text[..text.len() - 2]),
            Err(CodecError::InvalidLength {
                what: "secret",
                expected: 62,
                actual: 60
            })
        );
    }

    #[test]
    fn test_illegal_character_reports_index() {
        let mut text = format("apikey_", &[7u8; SECRET_LEN]);
        text.replace_range(20..21, "-");
        assert_eq!(
            parse("apikey_", &text),
            Err(CodecError::InvalidCharacter {
                what: "secret",
                index: 20,
                character: '-'
            })
        );
    }

    #[test]
    fn test_uppercase_rejected() {
        let text = format("apikey_", &[0xabu8; SECRET_LEN]).to_uppercase();
        // The prefix no longer matches once uppercased.
        assert!(matches!(
            parse("apikey_", &text),
            Err(CodecError::PrefixMismatch { .. })
        ));

        let text = format!(
            "apikey_{}",
            format("", &[0xabu8; SECRET_LEN]).to_uppercase()
        );
        match parse("apikey_", &text) {
            Err(CodecError::InvalidCharacter {
                index, character, ..
            }) => {
                assert!(index >= "apikey_".len());
                assert!(character.is_ascii_uppercase());
            }
            other => panic!("expected InvalidCharacter, got {other:?}"),
        }
    }

    #[test]
    fn test_overflow_rejected() {
        let text = format!("apikey_{}", "z".repeat(SECRET_WIDTH));
        assert_eq!(
            parse("apikey_", &text),
            Err(CodecError::Overflow { what: "secret" })
        );
    }

    #[test]
    fn test_prefix_validation() {
        assert!(validate_prefix("apikey_").is_ok());
        assert!(validate_prefix("acme_2024_").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("Acme_").is_err());
        assert!(validate_prefix("acme-").is_err());
        assert!(validate_prefix("acme.").is_err());
    }
}
