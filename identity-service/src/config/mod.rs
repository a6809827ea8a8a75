use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

use crate::models::SecretPrefixes;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// Default bearer secret prefixes. Tenants may override the API key
    /// prefix.
    #[serde(default)]
    pub secrets: SecretPrefixes,
    #[serde(default)]
    pub federation: FederationConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FederationConfig {
    /// Upper bound for any single call to an identity provider.
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    /// Lifetime of a pending OIDC attempt between redirect and callback.
    #[serde(default = "default_attempt_ttl_seconds")]
    pub attempt_ttl_seconds: u64,
}

fn default_http_timeout_seconds() -> u64 {
    10
}

fn default_attempt_ttl_seconds() -> u64 {
    600
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: default_http_timeout_seconds(),
            attempt_ttl_seconds: default_attempt_ttl_seconds(),
        }
    }
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let config: IdentityConfig = core_config::load_layered("configuration", "APP")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.secrets
            .validate()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid secret prefixes: {}", e)))?;

        if self.federation.http_timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "federation.http_timeout_seconds must be greater than zero"
            )));
        }
        if self.federation.attempt_ttl_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "federation.attempt_ttl_seconds must be greater than zero"
            )));
        }
        Ok(())
    }
}
