use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::models::{
    Actor, ApiKeyId, Attribution, AuditEntry, CredentialId, SessionId, TenantScope, UserId,
};
use crate::services::error::CredentialError;
use crate::services::resolver::CredentialResolver;
use crate::services::store::{CredentialStore, UserDirectory};

/// Destination for audit entries. The listing side lives elsewhere.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), anyhow::Error>;
}

/// The alternative ways a request can name its actor. Exactly one must be
/// set.
#[derive(Debug, Default)]
pub struct ActorAlternatives {
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
    pub api_key_id: Option<ApiKeyId>,
    pub bearer_token: Option<SecretString>,
}

#[derive(Debug)]
pub enum ActorReference {
    User(UserId),
    Session(SessionId),
    ApiKey(ApiKeyId),
    Bearer(SecretString),
}

impl ActorAlternatives {
    pub fn into_reference(self) -> Result<ActorReference, CredentialError> {
        let mut populated = Vec::new();
        if self.user_id.is_some() {
            populated.push("user_id");
        }
        if self.session_id.is_some() {
            populated.push("session_id");
        }
        if self.api_key_id.is_some() {
            populated.push("api_key_id");
        }
        if self.bearer_token.is_some() {
            populated.push("bearer_token");
        }
        if populated.len() != 1 {
            return Err(CredentialError::AmbiguousActorReference { populated });
        }

        let reference = match self {
            ActorAlternatives {
                user_id: Some(id), ..
            } => ActorReference::User(id),
            ActorAlternatives {
                session_id: Some(id),
                ..
            } => ActorReference::Session(id),
            ActorAlternatives {
                api_key_id: Some(id),
                ..
            } => ActorReference::ApiKey(id),
            ActorAlternatives {
                bearer_token: Some(token),
                ..
            } => ActorReference::Bearer(token),
            _ => return Err(CredentialError::AmbiguousActorReference { populated }),
        };
        Ok(reference)
    }
}

/// Resolves actor references and writes audit entries for them.
#[derive(Clone)]
pub struct AuditRecorder {
    resolver: CredentialResolver,
    credentials: Arc<dyn CredentialStore>,
    users: Arc<dyn UserDirectory>,
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        users: Arc<dyn UserDirectory>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: CredentialResolver::new(credentials.clone()),
            credentials,
            users,
            sink,
        }
    }

    /// Id references only have to exist in the tenant. A bearer reference
    /// goes through the attribution resolver.
    #[instrument(skip_all, fields(project_id = %scope.project_id()))]
    pub async fn resolve_actor(
        &self,
        scope: &TenantScope,
        alternatives: ActorAlternatives,
    ) -> Result<Actor, CredentialError> {
        let project_id = scope.project_id();
        match alternatives.into_reference()? {
            ActorReference::User(user_id) => {
                if self.users.user_exists(project_id, user_id).await? {
                    Ok(Actor::User { user_id })
                } else {
                    Err(CredentialError::NotFound)
                }
            }
            ActorReference::Session(session_id) => {
                let id = CredentialId::Session(session_id);
                match self.credentials.get_credential(project_id, id).await? {
                    Some(_) => Ok(Actor::Session { session_id }),
                    None => Err(CredentialError::NotFound),
                }
            }
            ActorReference::ApiKey(api_key_id) => {
                let id = CredentialId::ApiKey(api_key_id);
                match self.credentials.get_credential(project_id, id).await? {
                    Some(_) => Ok(Actor::ApiKey { credential_id: id }),
                    None => Err(CredentialError::NotFound),
                }
            }
            ActorReference::Bearer(token) => {
                match self
                    .resolver
                    .resolve_for_attribution(scope, token.expose_secret())
                    .await?
                {
                    Attribution::Verified(principal) => Ok(Actor::Credential { principal }),
                    Attribution::Unverified(principal) => Ok(Actor::Unverified { principal }),
                }
            }
        }
    }

    #[instrument(skip_all, fields(project_id = %scope.project_id(), event_type = %event_type))]
    pub async fn record(
        &self,
        scope: &TenantScope,
        alternatives: ActorAlternatives,
        event_type: &str,
        details: Option<serde_json::Value>,
    ) -> Result<AuditEntry, CredentialError> {
        let actor = self.resolve_actor(scope, alternatives).await?;
        let entry = AuditEntry::new(scope.project_id(), actor, event_type, details, Utc::now())?;
        self.sink.record(&entry).await?;
        tracing::info!(event_id = %entry.event_id, "Audit entry recorded");
        Ok(entry)
    }
}
