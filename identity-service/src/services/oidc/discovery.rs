//! OIDC discovery: fetching and checking provider metadata.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::OidcConnection;
use crate::services::error::FederationError;
use crate::utils::RequestContext;

/// The subset of `/.well-known/openid-configuration` the flow relies on.
///
/// Capability lists default to empty; an empty list means "not advertised"
/// and the protocol default is assumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub authorization_endpoint: String,
    #[serde(default)]
    pub token_endpoint: String,
    #[serde(default)]
    pub jwks_uri: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Vec<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// How the client authenticates at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    ClientSecretPost,
    ClientSecretBasic,
}

fn advertised_without(list: &[String], required: &str) -> bool {
    !list.is_empty() && !list.iter().any(|v| v == required)
}

impl ProviderMetadata {
    /// Reject providers that cannot run the flow this client implements.
    pub fn validate(&self) -> Result<(), FederationError> {
        for (name, value) in [
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("jwks_uri", &self.jwks_uri),
        ] {
            if value.trim().is_empty() {
                return Err(FederationError::Config(format!(
                    "Provider metadata is missing {}",
                    name
                )));
            }
        }

        if advertised_without(&self.grant_types_supported, "authorization_code") {
            return Err(FederationError::Config(
                "Provider does not support the authorization_code grant".to_string(),
            ));
        }
        self.client_auth_method()?;
        if advertised_without(&self.code_challenge_methods_supported, "S256") {
            return Err(FederationError::Config(
                "Provider does not support S256 code challenges".to_string(),
            ));
        }
        if advertised_without(&self.id_token_signing_alg_values_supported, "RS256") {
            return Err(FederationError::Config(
                "Provider does not sign ID tokens with RS256".to_string(),
            ));
        }
        Ok(())
    }

    /// `client_secret_post` when advertised, else `client_secret_basic`,
    /// which is also the default for an omitted list.
    pub fn client_auth_method(&self) -> Result<ClientAuthMethod, FederationError> {
        let methods = &self.token_endpoint_auth_methods_supported;
        if methods.is_empty() {
            return Ok(ClientAuthMethod::ClientSecretBasic);
        }
        if methods.iter().any(|m| m == "client_secret_post") {
            Ok(ClientAuthMethod::ClientSecretPost)
        } else if methods.iter().any(|m| m == "client_secret_basic") {
            Ok(ClientAuthMethod::ClientSecretBasic)
        } else {
            Err(FederationError::Config(
                "Provider supports neither client_secret_post nor client_secret_basic"
                    .to_string(),
            ))
        }
    }

    /// S256 is advertised, or the provider says nothing about PKCE.
    pub fn supports_pkce(&self) -> bool {
        !advertised_without(&self.code_challenge_methods_supported, "S256")
    }
}

#[instrument(skip_all, fields(connection_id = %connection.id))]
pub async fn discover(
    http: &reqwest::Client,
    ctx: &RequestContext,
    connection: &OidcConnection,
) -> Result<ProviderMetadata, FederationError> {
    let url = connection.discovery_url();
    let response = ctx.run(http.get(&url).send()).await??;

    if response.status() != reqwest::StatusCode::OK {
        tracing::warn!(status = %response.status(), url = %url, "Discovery request failed");
        return Err(FederationError::Transport(format!(
            "Discovery endpoint returned {}",
            response.status()
        )));
    }

    let metadata: ProviderMetadata = ctx.run(response.json()).await?.map_err(|e| {
        FederationError::Config(format!("Discovery document is not valid JSON: {}", e))
    })?;
    metadata.validate()?;

    tracing::debug!(
        authorization_endpoint = %metadata.authorization_endpoint,
        token_endpoint = %metadata.token_endpoint,
        "Discovered OIDC provider"
    );
    Ok(metadata)
}
