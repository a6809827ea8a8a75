use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;

use crate::codec::{secret, SecretBytes, SECRET_LEN};
use crate::models::{CredentialKind, SecretHash, TenantScope};
use crate::services::error::CredentialError;
use crate::services::hasher::hash_secret;

/// A freshly minted bearer secret.
///
/// `token` is handed to the caller exactly once; only `hash` is persisted.
#[derive(Debug)]
pub struct IssuedSecret {
    pub token: SecretString,
    pub hash: SecretHash,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecretIssuer;

impl SecretIssuer {
    pub fn new() -> Self {
        Self
    }

    /// Draw 35 bytes from the OS CSPRNG and encode them with the tenant's
    /// prefix for `kind`.
    pub fn issue(
        &self,
        scope: &TenantScope,
        kind: CredentialKind,
    ) -> Result<IssuedSecret, CredentialError> {
        self.issue_with_rng(&mut OsRng, scope, kind)
    }

    pub(crate) fn issue_with_rng<R: RngCore>(
        &self,
        rng: &mut R,
        scope: &TenantScope,
        kind: CredentialKind,
    ) -> Result<IssuedSecret, CredentialError> {
        let mut bytes: SecretBytes = [0u8; SECRET_LEN];
        rng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "OS entropy source failed during secret issuance");
            CredentialError::EntropyUnavailable(e.to_string())
        })?;

        let token = secret::format(scope.secret_prefixes().prefix_for(kind), &bytes);
        let hash = hash_secret(&bytes);
        tracing::debug!(
            project_id = %scope.project_id(),
            kind = kind.as_str(),
            "Issued bearer secret"
        );

        Ok(IssuedSecret {
            token: SecretString::new(token),
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectId, SecretPrefixes};
    use secrecy::ExposeSecret;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no entropy",
            )))
        }
    }

    fn scope() -> TenantScope {
        TenantScope::new(
            ProjectId::new(),
            "vault.acme.test",
            SecretPrefixes::default().with_api_key_prefix("acme_"),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_uses_kind_prefix_and_hashes_raw_bytes() {
        let scope = scope();
        let issued = SecretIssuer::new()
            .issue(&scope, CredentialKind::ApiKey)
            .unwrap();
        let token = issued.token.expose_secret();
        assert!(token.starts_with("acme_"));
        assert_eq!(token.len(), secret::encoded_len("acme_"));

        let bytes = secret::parse("acme_", token).unwrap();
        assert_eq!(hash_secret(&bytes), issued.hash);
    }

    #[test]
    fn test_consecutive_secrets_differ() {
        let scope = scope();
        let issuer = SecretIssuer::new();
        let a = issuer.issue(&scope, CredentialKind::Session).unwrap();
        let b = issuer.issue(&scope, CredentialKind::Session).unwrap();
        assert_ne!(a.token.expose_secret(), b.token.expose_secret());
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_entropy_failure_is_distinct() {
        let result = SecretIssuer::new().issue_with_rng(&mut BrokenRng, &scope(), CredentialKind::ApiKey);
        assert!(matches!(
            result,
            Err(CredentialError::EntropyUnavailable(_))
        ));
    }
}
