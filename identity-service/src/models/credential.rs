use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use subtle::ConstantTimeEq;

use crate::models::{
    ApiKeyId, BackendApiKeyId, ImpersonationTokenId, OrganizationId, ProjectId, ScimApiKeyId,
    SessionId, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    ApiKey,
    BackendApiKey,
    ScimApiKey,
    Session,
    ShortLivedToken,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 5] = [
        CredentialKind::ApiKey,
        CredentialKind::BackendApiKey,
        CredentialKind::ScimApiKey,
        CredentialKind::Session,
        CredentialKind::ShortLivedToken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::ApiKey => "api_key",
            CredentialKind::BackendApiKey => "backend_api_key",
            CredentialKind::ScimApiKey => "scim_api_key",
            CredentialKind::Session => "session",
            CredentialKind::ShortLivedToken => "short_lived_token",
        }
    }

    /// API key kinds carry an action list.
    pub fn carries_actions(&self) -> bool {
        matches!(
            self,
            CredentialKind::ApiKey | CredentialKind::BackendApiKey | CredentialKind::ScimApiKey
        )
    }
}

/// Typed id of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CredentialId {
    ApiKey(ApiKeyId),
    BackendApiKey(BackendApiKeyId),
    ScimApiKey(ScimApiKeyId),
    Session(SessionId),
    ShortLivedToken(ImpersonationTokenId),
}

impl CredentialId {
    pub fn new(kind: CredentialKind) -> Self {
        match kind {
            CredentialKind::ApiKey => CredentialId::ApiKey(ApiKeyId::new()),
            CredentialKind::BackendApiKey => CredentialId::BackendApiKey(BackendApiKeyId::new()),
            CredentialKind::ScimApiKey => CredentialId::ScimApiKey(ScimApiKeyId::new()),
            CredentialKind::Session => CredentialId::Session(SessionId::new()),
            CredentialKind::ShortLivedToken => {
                CredentialId::ShortLivedToken(ImpersonationTokenId::new())
            }
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialId::ApiKey(_) => CredentialKind::ApiKey,
            CredentialId::BackendApiKey(_) => CredentialKind::BackendApiKey,
            CredentialId::ScimApiKey(_) => CredentialKind::ScimApiKey,
            CredentialId::Session(_) => CredentialKind::Session,
            CredentialId::ShortLivedToken(_) => CredentialKind::ShortLivedToken,
        }
    }
}

impl Display for CredentialId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialId::ApiKey(id) => Display::fmt(id, f),
            CredentialId::BackendApiKey(id) => Display::fmt(id, f),
            CredentialId::ScimApiKey(id) => Display::fmt(id, f),
            CredentialId::Session(id) => Display::fmt(id, f),
            CredentialId::ShortLivedToken(id) => Display::fmt(id, f),
        }
    }
}

/// SHA-256 digest of raw secret bytes. The only form of a secret that is
/// ever stored.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct SecretHash(#[serde(with = "hex_digest")] [u8; 32]);

impl SecretHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn ct_eq(&self, other: &SecretHash) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl PartialEq for SecretHash {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other)
    }
}

impl Eq for SecretHash {}

impl std::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretHash({}..)", hex::encode(&self.0[..4]))
    }
}

mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(&text, &mut out).map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

/// A stored credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub project_id: ProjectId,
    pub organization_id: Option<OrganizationId>,
    pub user_id: Option<UserId>,
    /// `None` once revoked. Never set back.
    pub secret_hash: Option<SecretHash>,
    #[serde(default)]
    pub actions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    pub fn new(id: CredentialId, project_id: ProjectId, secret_hash: SecretHash) -> Self {
        Self {
            id,
            project_id,
            organization_id: None,
            user_id: None,
            secret_hash: Some(secret_hash),
            actions: Vec::new(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.id.kind()
    }

    pub fn is_revoked(&self) -> bool {
        self.secret_hash.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }

    pub fn revoke(&mut self) {
        self.secret_hash = None;
    }
}
