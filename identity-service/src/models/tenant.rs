use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{secret, CodecError};
use crate::models::{CredentialKind, ProjectId};

#[derive(Debug, Error)]
pub enum TenantScopeError {
    #[error("invalid vault domain {0:?}")]
    InvalidVaultDomain(String),

    #[error(transparent)]
    InvalidPrefix(#[from] CodecError),

    #[error("secret prefix {0:?} is used by more than one credential kind")]
    DuplicatePrefix(String),
}

/// Bearer secret prefixes, one per credential kind.
///
/// The API key prefix is usually tenant specific (`acme_live_`); the others
/// are shared defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPrefixes {
    #[serde(default = "default_api_key_prefix")]
    pub api_key: String,
    #[serde(default = "default_backend_api_key_prefix")]
    pub backend_api_key: String,
    #[serde(default = "default_scim_api_key_prefix")]
    pub scim_api_key: String,
    #[serde(default = "default_session_prefix")]
    pub session: String,
    #[serde(default = "default_short_lived_token_prefix")]
    pub short_lived_token: String,
}

fn default_api_key_prefix() -> String {
    "apikey_".to_string()
}

fn default_backend_api_key_prefix() -> String {
    "backend_apikey_".to_string()
}

fn default_scim_api_key_prefix() -> String {
    "scim_apikey_".to_string()
}

fn default_session_prefix() -> String {
    "session_token_".to_string()
}

fn default_short_lived_token_prefix() -> String {
    "impersonation_token_".to_string()
}

impl Default for SecretPrefixes {
    fn default() -> Self {
        Self {
            api_key: default_api_key_prefix(),
            backend_api_key: default_backend_api_key_prefix(),
            scim_api_key: default_scim_api_key_prefix(),
            session: default_session_prefix(),
            short_lived_token: default_short_lived_token_prefix(),
        }
    }
}

impl SecretPrefixes {
    pub fn with_api_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_key = prefix.into();
        self
    }

    pub fn prefix_for(&self, kind: CredentialKind) -> &str {
        match kind {
            CredentialKind::ApiKey => &self.api_key,
            CredentialKind::BackendApiKey => &self.backend_api_key,
            CredentialKind::ScimApiKey => &self.scim_api_key,
            CredentialKind::Session => &self.session,
            CredentialKind::ShortLivedToken => &self.short_lived_token,
        }
    }

    fn entries(&self) -> [(CredentialKind, &str); 5] {
        CredentialKind::ALL.map(|kind| (kind, self.prefix_for(kind)))
    }

    /// Pick the credential kind whose prefix fits `token`.
    ///
    /// Among the prefixes `token` starts with, one that also yields the exact
    /// secret length wins; ties and the no-exact-length case go to the
    /// longest prefix.
    pub fn match_token(&self, token: &str) -> Option<(CredentialKind, &str)> {
        let candidates = self
            .entries()
            .into_iter()
            .filter(|(_, prefix)| token.starts_with(prefix));

        candidates.max_by_key(|(_, prefix)| {
            (secret::encoded_len(prefix) == token.len(), prefix.len())
        })
    }

    pub fn validate(&self) -> Result<(), TenantScopeError> {
        let entries = self.entries();
        for (i, (_, prefix)) in entries.iter().enumerate() {
            secret::validate_prefix(prefix)?;
            if entries[..i].iter().any(|(_, other)| other == prefix) {
                return Err(TenantScopeError::DuplicatePrefix(prefix.to_string()));
            }
        }
        Ok(())
    }
}

/// The tenant every credential, connection and lookup is confined to.
///
/// Passed explicitly to every operation; nothing in this crate reads a
/// tenant from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    project_id: ProjectId,
    vault_domain: String,
    secret_prefixes: SecretPrefixes,
}

impl TenantScope {
    pub fn new(
        project_id: ProjectId,
        vault_domain: impl Into<String>,
        secret_prefixes: SecretPrefixes,
    ) -> Result<Self, TenantScopeError> {
        let vault_domain = vault_domain.into();
        match url::Host::parse(&vault_domain) {
            Ok(url::Host::Domain(_)) if !vault_domain.is_empty() => {}
            _ => return Err(TenantScopeError::InvalidVaultDomain(vault_domain)),
        }
        secret_prefixes.validate()?;

        Ok(Self {
            project_id,
            vault_domain,
            secret_prefixes,
        })
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn vault_domain(&self) -> &str {
        &self.vault_domain
    }

    pub fn secret_prefixes(&self) -> &SecretPrefixes {
        &self.secret_prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_rejects_bad_domain() {
        for domain in ["", "vault.example.com/path", "vault example.com", "127.0.0.1"] {
            assert!(
                TenantScope::new(ProjectId::new(), domain, SecretPrefixes::default()).is_err(),
                "{domain}"
            );
        }
        assert!(
            TenantScope::new(ProjectId::new(), "vault.acme.test", SecretPrefixes::default())
                .is_ok()
        );
    }

    #[test]
    fn test_prefix_validation() {
        let bad = SecretPrefixes::default().with_api_key_prefix("Acme-");
        assert!(matches!(
            bad.validate(),
            Err(TenantScopeError::InvalidPrefix(_))
        ));

        let dup = SecretPrefixes::default().with_api_key_prefix("session_token_");
        assert!(matches!(
            dup.validate(),
            Err(TenantScopeError::DuplicatePrefix(_))
        ));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let prefixes = SecretPrefixes::default().with_api_key_prefix("backend_");
        let token = format!("backend_apikey_{}", "0".repeat(secret::SECRET_WIDTH));
        let (kind, prefix) = prefixes.match_token(&token).unwrap();
        assert_eq!(kind, CredentialKind::BackendApiKey);
        assert_eq!(prefix, "backend_apikey_");
    }

    #[test]
    fn test_exact_length_beats_longer_prefix() {
        // "backend_apikey_..." is also a valid body for the "backend_" prefix
        // when its total length matches that prefix instead.
        let prefixes = SecretPrefixes::default().with_api_key_prefix("backend_");
        let body = format!("apikey_{}", "0".repeat(secret::SECRET_WIDTH - 7));
        let token = format!("backend_{body}");
        assert_eq!(token.len(), secret::encoded_len("backend_"));
        let (kind, _) = prefixes.match_token(&token).unwrap();
        assert_eq!(kind, CredentialKind::ApiKey);
    }

    #[test]
    fn test_unknown_prefix() {
        assert!(SecretPrefixes::default().match_token("zzz_123").is_none());
    }
}
