//! Text codecs for everything the vault hands out: entity identifiers and
//! bearer secrets.

pub mod alphabet;
pub mod identifier;
pub mod secret;

use thiserror::Error;

pub use identifier::{IdKind, IDENTIFIER_WIDTH};
pub use secret::{SecretBytes, SECRET_LEN, SECRET_WIDTH};

/// Malformed identifier or secret text. Always a caller error.
///
/// None of the variants carry the rejected input: secret text must never
/// end up in logs or responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid {what}: expected prefix {expected:?}")]
    PrefixMismatch {
        what: &'static str,
        expected: String,
    },

    #[error("invalid {what}: expected length {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {what}: illegal character {character:?} at index {index}")]
    InvalidCharacter {
        what: &'static str,
        index: usize,
        character: char,
    },

    #[error("invalid {what}: value out of range")]
    Overflow { what: &'static str },

    #[error("invalid secret prefix {0:?}: must match [a-z0-9_]+")]
    InvalidPrefix(String),
}

/// Checks shared by both codecs: prefix, exact length, then the symbols.
///
/// `what` names the kind of text for error messages.
fn split_body<'a>(
    what: &'static str,
    prefix: &str,
    width: usize,
    text: &'a str,
) -> Result<&'a str, CodecError> {
    let body = text
        .strip_prefix(prefix)
        .ok_or_else(|| CodecError::PrefixMismatch {
            what,
            expected: prefix.to_string(),
        })?;

    let expected = prefix.len() + width;
    if text.len() != expected {
        return Err(CodecError::InvalidLength {
            what,
            expected,
            actual: text.len(),
        });
    }

    Ok(body)
}

/// Decode the symbols after `prefix`, translating faults into [`CodecError`].
/// Reported character indexes are offsets into the whole text.
fn decode_body<const N: usize>(
    what: &'static str,
    prefix: &str,
    body: &str,
) -> Result<[u8; N], CodecError> {
    alphabet::decode_fixed::<N>(body).map_err(|fault| match fault {
        alphabet::DecodeFault::IllegalSymbol { index, character } => {
            CodecError::InvalidCharacter {
                what,
                index: prefix.len() + index,
                character,
            }
        }
        alphabet::DecodeFault::Overflow => CodecError::Overflow { what },
    })
}
