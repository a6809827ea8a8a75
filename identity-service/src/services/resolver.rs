use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::codec::secret;
use crate::models::{
    Attribution, AttributionOnlyPrincipal, OrganizationId, ProjectId, SessionId, TenantScope,
    UserId, VerifiedPrincipal,
};
use crate::services::error::CredentialError;
use crate::services::hasher::hash_secret;
use crate::services::store::CredentialStore;

/// Syntactic shape of a bearer string, decided before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerShape<'a> {
    /// `header.payload.signature`, each segment base64url.
    Compact { payload: &'a str },
    /// `[a-z0-9_]+`
    Secret,
}

impl<'a> BearerShape<'a> {
    pub fn classify(bearer: &'a str) -> Result<Self, CredentialError> {
        let segments: Vec<&str> = bearer.split('.').collect();
        if segments.len() == 3 && segments.iter().all(|s| is_base64url_segment(s)) {
            return Ok(BearerShape::Compact {
                payload: segments[1],
            });
        }

        let flat = !bearer.is_empty()
            && bearer
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if flat {
            Ok(BearerShape::Secret)
        } else {
            Err(CredentialError::MalformedBearer)
        }
    }
}

fn is_base64url_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug, Deserialize)]
struct CompactClaims {
    project_id: ProjectId,
    #[serde(default)]
    organization_id: Option<OrganizationId>,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    session_id: Option<SessionId>,
}

/// Turns bearer strings into principals within one tenant.
///
/// No result is cached: a revocation is visible on the very next call.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Privilege path. Only secret tokens are accepted.
    #[instrument(skip_all, fields(project_id = %scope.project_id()))]
    pub async fn authenticate(
        &self,
        scope: &TenantScope,
        bearer: &str,
    ) -> Result<VerifiedPrincipal, CredentialError> {
        match BearerShape::classify(bearer)? {
            BearerShape::Compact { .. } => {
                tracing::warn!("Compact token presented on an authenticating path");
                Err(CredentialError::CompactTokenRejected)
            }
            BearerShape::Secret => self.resolve_secret(scope, bearer).await,
        }
    }

    /// Attribution path. Compact tokens are decoded without verification and
    /// come back as [`Attribution::Unverified`].
    #[instrument(skip_all, fields(project_id = %scope.project_id()))]
    pub async fn resolve_for_attribution(
        &self,
        scope: &TenantScope,
        bearer: &str,
    ) -> Result<Attribution, CredentialError> {
        match BearerShape::classify(bearer)? {
            BearerShape::Compact { payload } => {
                decode_compact(scope, payload).map(Attribution::Unverified)
            }
            BearerShape::Secret => self
                .resolve_secret(scope, bearer)
                .await
                .map(Attribution::Verified),
        }
    }

    async fn resolve_secret(
        &self,
        scope: &TenantScope,
        token: &str,
    ) -> Result<VerifiedPrincipal, CredentialError> {
        let (kind, prefix) = scope
            .secret_prefixes()
            .match_token(token)
            .ok_or(CredentialError::MalformedBearer)?;
        let bytes = secret::parse(prefix, token)?;
        let hash = hash_secret(&bytes);

        let record = self
            .store
            .find_by_hash(scope.project_id(), kind, &hash)
            .await?;

        let record = match record {
            Some(record)
                if record.project_id == scope.project_id()
                    && record.kind() == kind
                    && record
                        .secret_hash
                        .as_ref()
                        .is_some_and(|stored| stored.ct_eq(&hash))
                    && record.is_live(Utc::now()) =>
            {
                record
            }
            _ => {
                tracing::debug!(kind = kind.as_str(), "No live credential for secret");
                return Err(CredentialError::NotFound);
            }
        };

        tracing::debug!(credential_id = %record.id, "Resolved bearer secret");
        Ok(VerifiedPrincipal::new(
            record.id,
            record.project_id,
            record.organization_id,
            record.user_id,
            record.actions,
        ))
    }
}

fn decode_compact(
    scope: &TenantScope,
    payload: &str,
) -> Result<AttributionOnlyPrincipal, CredentialError> {
    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| CredentialError::MalformedBearer)?;
    let claims: CompactClaims =
        serde_json::from_slice(&json).map_err(|_| CredentialError::MalformedBearer)?;

    if claims.project_id != scope.project_id() {
        tracing::debug!("Compact token names a different project");
        return Err(CredentialError::NotFound);
    }

    Ok(AttributionOnlyPrincipal {
        project_id: claims.project_id,
        organization_id: claims.organization_id,
        user_id: claims.user_id,
        session_id: claims.session_id,
    })
}
