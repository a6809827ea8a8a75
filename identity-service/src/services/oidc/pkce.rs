use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use crate::services::error::FederationError;

/// 32 random bytes, base64url without padding.
pub fn random_token() -> Result<String, FederationError> {
    let mut bytes = [0u8; 32];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "OS entropy source failed during OIDC attempt");
        FederationError::EntropyUnavailable(e.to_string())
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[derive(Debug)]
pub struct PkcePair {
    pub verifier: SecretString,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Result<Self, FederationError> {
        let verifier = random_token()?;
        let challenge = s256_challenge(&verifier);
        Ok(Self {
            verifier: SecretString::new(verifier),
            challenge,
        })
    }
}

pub fn s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
