//! JWKS documents and lookup.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::services::error::FederationError;
use crate::utils::RequestContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    pub fn is_rsa(&self) -> bool {
        self.kty == "RSA"
    }

    pub fn is_signing_key(&self) -> bool {
        self.use_.is_none() || self.use_.as_deref() == Some("sig")
    }
}

/// One GET, no caching: keys are fetched per verification.
#[instrument(skip_all, fields(jwks_uri = %jwks_uri))]
pub async fn fetch(
    http: &reqwest::Client,
    ctx: &RequestContext,
    jwks_uri: &str,
) -> Result<JwkSet, FederationError> {
    let response = ctx.run(http.get(jwks_uri).send()).await??;
    if response.status() != reqwest::StatusCode::OK {
        tracing::warn!(status = %response.status(), "JWKS request failed");
        return Err(FederationError::Transport(format!(
            "JWKS endpoint returned {}",
            response.status()
        )));
    }

    ctx.run(response.json::<JwkSet>())
        .await?
        .map_err(|e| FederationError::Config(format!("JWKS document is not valid JSON: {}", e)))
}
