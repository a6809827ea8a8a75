//! ID token verification against the provider's JWKS.
//!
//! Only RS256 is accepted, in the token header and on the key itself. The
//! header must name a `kid` present in the key set; there is no fallback to
//! "the first RSA key".

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::jwks::JwkSet;
use crate::services::error::FederationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|a| a == value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

/// What the verified claims must match.
#[derive(Debug, Clone)]
pub struct ExpectedClaims<'a> {
    pub issuer: &'a str,
    pub client_id: &'a str,
    pub nonce: Option<&'a str>,
}

fn reject(reason: impl Into<String>) -> FederationError {
    let reason = reason.into();
    tracing::warn!(reason = %reason, "ID token rejected");
    FederationError::Verification(reason)
}

pub fn verify_id_token(
    id_token: &str,
    jwks: &JwkSet,
    expected: &ExpectedClaims<'_>,
) -> Result<IdTokenClaims, FederationError> {
    let header =
        decode_header(id_token).map_err(|e| reject(format!("malformed token header: {}", e)))?;
    if header.alg != Algorithm::RS256 {
        return Err(reject(format!("unsupported algorithm {:?}", header.alg)));
    }

    let kid = header
        .kid
        .ok_or_else(|| reject("token header has no kid"))?;
    let jwk = jwks
        .find_key(&kid)
        .ok_or_else(|| reject(format!("kid {} not in JWKS", kid)))?;

    if !jwk.is_rsa() || !jwk.is_signing_key() {
        return Err(reject(format!("key {} is not an RSA signing key", kid)));
    }
    match jwk.alg.as_deref() {
        Some("RS256") => {}
        Some(alg) => return Err(reject(format!("key {} is for {}", kid, alg))),
        None => return Err(reject(format!("key {} does not declare RS256", kid))),
    }

    let (n, e) = match (jwk.n.as_deref(), jwk.e.as_deref()) {
        (Some(n), Some(e)) => (n, e),
        _ => return Err(reject(format!("key {} lacks RSA components", kid))),
    };
    let key = DecodingKey::from_rsa_components(n, e)
        .map_err(|err| reject(format!("key {} is unusable: {}", kid, err)))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.set_audience(&[expected.client_id]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

    let claims = decode::<IdTokenClaims>(id_token, &key, &validation)
        .map_err(|e| reject(format!("{}", e)))?
        .claims;

    if claims.iss != expected.issuer {
        return Err(reject(format!(
            "issuer {} does not match {}",
            claims.iss, expected.issuer
        )));
    }
    if !claims.aud.contains(expected.client_id) {
        return Err(reject("audience does not contain client id"));
    }
    if let Some(nonce) = expected.nonce {
        if claims.nonce.as_deref() != Some(nonce) {
            return Err(reject("nonce mismatch"));
        }
    }

    tracing::info!(issuer = %claims.iss, subject = %claims.sub, kid = %kid, "ID token verified");
    Ok(claims)
}
