use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::discovery::{self, ClientAuthMethod};
use super::jwks;
use super::pkce::{self, PkcePair};
use super::verifier::{verify_id_token, ExpectedClaims};
use crate::config::FederationConfig;
use crate::models::{
    ConnectionId, FederatedConnection, OidcConnection, OidcConnectionId, ProjectId, TenantScope,
};
use crate::services::error::FederationError;
use crate::services::store::{ConnectionStore, FederationAttemptStore, SecretDecryptor};
use crate::utils::RequestContext;

/// Redirect URI registered with the provider for one connection.
pub fn redirect_uri(vault_domain: &str, connection_id: OidcConnectionId) -> String {
    format!(
        "https://{}/api/oidc/v1/{}/callback",
        vault_domain, connection_id
    )
}

/// State kept between the redirect to the provider and its callback.
#[derive(Debug)]
pub struct PendingAttempt {
    pub state: String,
    pub nonce: String,
    pub pkce_verifier: Option<SecretString>,
    pub project_id: ProjectId,
    pub connection_id: OidcConnectionId,
    pub redirect_uri: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub auth_method: ClientAuthMethod,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    /// Where to send the user agent.
    pub url: String,
    pub state: String,
}

/// Query parameters the provider sends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub state: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederatedIdentity {
    pub connection_id: OidcConnectionId,
    pub project_id: ProjectId,
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Runs the authorization-code flow against a tenant's OIDC connections.
///
/// Each network call is made once and raced against the caller's
/// [`RequestContext`]; nothing is retried.
#[derive(Clone)]
pub struct OidcFederationClient {
    http: reqwest::Client,
    connections: Arc<dyn ConnectionStore>,
    attempts: Arc<dyn FederationAttemptStore>,
    decryptor: Arc<dyn SecretDecryptor>,
    attempt_ttl: chrono::Duration,
}

impl OidcFederationClient {
    pub fn new(
        http: reqwest::Client,
        connections: Arc<dyn ConnectionStore>,
        attempts: Arc<dyn FederationAttemptStore>,
        decryptor: Arc<dyn SecretDecryptor>,
        attempt_ttl: Duration,
    ) -> Result<Self, FederationError> {
        let attempt_ttl = chrono::Duration::from_std(attempt_ttl)
            .map_err(|e| FederationError::Config(format!("Invalid attempt TTL: {}", e)))?;
        Ok(Self {
            http,
            connections,
            attempts,
            decryptor,
            attempt_ttl,
        })
    }

    pub fn from_config(
        config: &FederationConfig,
        connections: Arc<dyn ConnectionStore>,
        attempts: Arc<dyn FederationAttemptStore>,
        decryptor: Arc<dyn SecretDecryptor>,
    ) -> Result<Self, FederationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FederationError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Self::new(
            http,
            connections,
            attempts,
            decryptor,
            Duration::from_secs(config.attempt_ttl_seconds),
        )
    }

    /// Discover the provider, record a pending attempt and return the
    /// authorization URL to redirect to.
    #[instrument(skip_all, fields(project_id = %scope.project_id(), connection_id = %connection_id))]
    pub async fn begin(
        &self,
        ctx: &RequestContext,
        scope: &TenantScope,
        connection_id: OidcConnectionId,
    ) -> Result<AuthorizationRequest, FederationError> {
        let connection = self.load_connection(scope, connection_id).await?;
        let metadata = discovery::discover(&self.http, ctx, &connection).await?;
        let auth_method = metadata.client_auth_method()?;

        let state = pkce::random_token()?;
        let nonce = pkce::random_token()?;
        let pkce_pair = if metadata.supports_pkce() {
            Some(PkcePair::generate()?)
        } else {
            None
        };
        let redirect_uri = redirect_uri(scope.vault_domain(), connection.id);

        let mut url = Url::parse(&metadata.authorization_endpoint).map_err(|e| {
            FederationError::Config(format!("Invalid authorization endpoint: {}", e))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &connection.client_id)
                .append_pair("redirect_uri", &redirect_uri)
                .append_pair("scope", &scope_param(&connection.scopes))
                .append_pair("state", &state)
                .append_pair("nonce", &nonce);
            if let Some(pair) = &pkce_pair {
                query
                    .append_pair("code_challenge", &pair.challenge)
                    .append_pair("code_challenge_method", "S256");
            }
        }

        self.attempts
            .put_attempt(PendingAttempt {
                state: state.clone(),
                nonce,
                pkce_verifier: pkce_pair.map(|p| p.verifier),
                project_id: scope.project_id(),
                connection_id: connection.id,
                redirect_uri,
                token_endpoint: metadata.token_endpoint,
                jwks_uri: metadata.jwks_uri,
                auth_method,
                expires_at: Utc::now() + self.attempt_ttl,
            })
            .await?;

        tracing::info!("OIDC attempt started");
        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
        })
    }

    /// Handle the provider's callback: exchange the code, verify the ID
    /// token and return the federated identity.
    #[instrument(skip_all, fields(project_id = %scope.project_id()))]
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        scope: &TenantScope,
        callback: CallbackParams,
    ) -> Result<FederatedIdentity, FederationError> {
        let attempt = self
            .attempts
            .take_attempt(scope.project_id(), &callback.state)
            .await?
            .ok_or_else(|| {
                tracing::warn!("OIDC callback for an unknown, expired or foreign attempt");
                FederationError::InvalidState
            })?;

        if attempt.project_id != scope.project_id() || attempt.expires_at <= Utc::now() {
            tracing::warn!("OIDC callback for an expired or foreign attempt");
            return Err(FederationError::InvalidState);
        }

        if let Some(error) = callback.error {
            let description = callback.error_description.unwrap_or_default();
            tracing::warn!(error = %error, description = %description, "Provider returned an error");
            return Err(FederationError::ProviderRejected(error));
        }
        let code = callback.code.ok_or_else(|| {
            FederationError::ProviderRejected("authorization response has no code".to_string())
        })?;

        let connection = self.load_connection(scope, attempt.connection_id).await?;
        let client_secret = self
            .decryptor
            .decrypt(scope.project_id(), &connection.encrypted_client_secret)
            .await
            .map_err(|e| FederationError::SecretDecryption(e.to_string()))?;

        let id_token = self
            .exchange_code(ctx, &connection, &attempt, &code, &client_secret)
            .await?;

        let key_set = jwks::fetch(&self.http, ctx, &attempt.jwks_uri).await?;
        let claims = verify_id_token(
            &id_token,
            &key_set,
            &ExpectedClaims {
                issuer: &connection.issuer,
                client_id: &connection.client_id,
                nonce: Some(&attempt.nonce),
            },
        )?;

        tracing::info!(subject = %claims.sub, "OIDC attempt completed");
        Ok(FederatedIdentity {
            connection_id: connection.id,
            project_id: connection.project_id,
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            name: claims.name,
        })
    }

    async fn exchange_code(
        &self,
        ctx: &RequestContext,
        connection: &OidcConnection,
        attempt: &PendingAttempt,
        code: &str,
        client_secret: &SecretString,
    ) -> Result<String, FederationError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", attempt.redirect_uri.as_str()),
        ];
        if let Some(verifier) = &attempt.pkce_verifier {
            params.push(("code_verifier", verifier.expose_secret()));
        }

        let request = self.http.post(&attempt.token_endpoint);
        let request = match attempt.auth_method {
            ClientAuthMethod::ClientSecretPost => {
                params.push(("client_id", connection.client_id.as_str()));
                params.push(("client_secret", client_secret.expose_secret()));
                request
            }
            ClientAuthMethod::ClientSecretBasic => request.basic_auth(
                form_encode(&connection.client_id),
                Some(form_encode(client_secret.expose_secret())),
            ),
        };

        let response = ctx.run(request.form(&params).send()).await??;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = %status, "Token endpoint rejected code exchange");
            return Err(FederationError::Transport(format!(
                "Token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = ctx.run(response.json()).await?.map_err(|e| {
            FederationError::Transport(format!("Token response is not valid JSON: {}", e))
        })?;
        body.id_token.ok_or_else(|| {
            FederationError::Config("Token response has no id_token; is the openid scope enabled?".to_string())
        })
    }

    async fn load_connection(
        &self,
        scope: &TenantScope,
        connection_id: OidcConnectionId,
    ) -> Result<OidcConnection, FederationError> {
        match self
            .connections
            .get_connection(scope.project_id(), ConnectionId::Oidc(connection_id))
            .await?
        {
            Some(FederatedConnection::Oidc(connection))
                if connection.project_id == scope.project_id() =>
            {
                Ok(connection)
            }
            _ => Err(FederationError::ConnectionNotFound),
        }
    }
}

fn scope_param(scopes: &[String]) -> String {
    let mut all = vec!["openid"];
    all.extend(scopes.iter().map(String::as_str).filter(|s| *s != "openid"));
    all.join(" ")
}

/// `client_secret_basic` credentials are form-urlencoded before base64.
fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
