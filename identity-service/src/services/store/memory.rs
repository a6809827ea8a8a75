use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{ConnectionStore, CredentialStore, FederationAttemptStore, UserDirectory};
use crate::models::{
    ConnectionId, ConnectionVariant, CredentialId, CredentialKind, CredentialRecord,
    FederatedConnection, ProjectId, SecretHash, UserId,
};
use crate::services::oidc::PendingAttempt;

/// Process-local implementation of every store trait. Used by tests and by
/// embedders that do not need persistence.
#[derive(Default)]
pub struct InMemoryStore {
    credentials: Mutex<HashMap<CredentialId, CredentialRecord>>,
    users: Mutex<HashSet<(ProjectId, UserId)>>,
    connections: Mutex<Vec<FederatedConnection>>,
    attempts: Mutex<HashMap<String, PendingAttempt>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, project_id: ProjectId, user_id: UserId) -> Result<(), anyhow::Error> {
        self.users
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory user mutex poisoned: {}", e))?
            .insert((project_id, user_id));
        Ok(())
    }

    /// Number of attempts currently held, expired or not.
    pub fn pending_attempts(&self) -> Result<usize, anyhow::Error> {
        Ok(self
            .attempts
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory attempt mutex poisoned: {}", e))?
            .len())
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn insert_credential(&self, record: CredentialRecord) -> Result<(), anyhow::Error> {
        let mut credentials = self
            .credentials
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory credential mutex poisoned: {}", e))?;
        if credentials.contains_key(&record.id) {
            return Err(anyhow::anyhow!("Credential {} already exists", record.id));
        }
        credentials.insert(record.id, record);
        Ok(())
    }

    async fn find_by_hash(
        &self,
        project_id: ProjectId,
        kind: CredentialKind,
        hash: &SecretHash,
    ) -> Result<Option<CredentialRecord>, anyhow::Error> {
        let credentials = self
            .credentials
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory credential mutex poisoned: {}", e))?;
        Ok(credentials
            .values()
            .find(|record| {
                record.project_id == project_id
                    && record.kind() == kind
                    && record
                        .secret_hash
                        .as_ref()
                        .is_some_and(|stored| stored.ct_eq(hash))
            })
            .cloned())
    }

    async fn get_credential(
        &self,
        project_id: ProjectId,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, anyhow::Error> {
        let credentials = self
            .credentials
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory credential mutex poisoned: {}", e))?;
        Ok(credentials
            .get(&id)
            .filter(|record| record.project_id == project_id)
            .cloned())
    }

    async fn revoke(&self, project_id: ProjectId, id: CredentialId) -> Result<bool, anyhow::Error> {
        let mut credentials = self
            .credentials
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory credential mutex poisoned: {}", e))?;
        match credentials.get_mut(&id) {
            Some(record) if record.project_id == project_id => {
                record.revoke();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn user_exists(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<bool, anyhow::Error> {
        let users = self
            .users
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory user mutex poisoned: {}", e))?;
        Ok(users.contains(&(project_id, user_id)))
    }
}

fn clear_other_primaries(
    connections: &mut [FederatedConnection],
    project_id: ProjectId,
    keep: ConnectionId,
) {
    let variant = keep.variant();
    for other in connections.iter_mut() {
        if other.project_id() == project_id && other.variant() == variant && other.id() != keep {
            other.set_primary(false);
        }
    }
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
    async fn save_connection(&self, connection: FederatedConnection) -> Result<(), anyhow::Error> {
        let mut connections = self
            .connections
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory connection mutex poisoned: {}", e))?;

        let id = connection.id();
        let project_id = connection.project_id();
        if connection.is_primary() {
            clear_other_primaries(&mut connections, project_id, id);
        }

        match connections
            .iter_mut()
            .find(|c| c.project_id() == project_id && c.id() == id)
        {
            Some(existing) => *existing = connection,
            None => connections.push(connection),
        }
        Ok(())
    }

    async fn get_connection(
        &self,
        project_id: ProjectId,
        id: ConnectionId,
    ) -> Result<Option<FederatedConnection>, anyhow::Error> {
        let connections = self
            .connections
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory connection mutex poisoned: {}", e))?;
        Ok(connections
            .iter()
            .find(|c| c.project_id() == project_id && c.id() == id)
            .cloned())
    }

    async fn set_primary(
        &self,
        project_id: ProjectId,
        id: ConnectionId,
    ) -> Result<bool, anyhow::Error> {
        let mut connections = self
            .connections
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory connection mutex poisoned: {}", e))?;

        if !connections
            .iter()
            .any(|c| c.project_id() == project_id && c.id() == id)
        {
            return Ok(false);
        }

        clear_other_primaries(&mut connections, project_id, id);
        for connection in connections.iter_mut() {
            if connection.project_id() == project_id && connection.id() == id {
                connection.set_primary(true);
            }
        }
        Ok(true)
    }

    async fn primary_connection(
        &self,
        project_id: ProjectId,
        variant: ConnectionVariant,
    ) -> Result<Option<FederatedConnection>, anyhow::Error> {
        let connections = self
            .connections
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory connection mutex poisoned: {}", e))?;
        Ok(connections
            .iter()
            .find(|c| c.project_id() == project_id && c.variant() == variant && c.is_primary())
            .cloned())
    }

    async fn list_connections(
        &self,
        project_id: ProjectId,
        variant: ConnectionVariant,
    ) -> Result<Vec<FederatedConnection>, anyhow::Error> {
        let connections = self
            .connections
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory connection mutex poisoned: {}", e))?;
        Ok(connections
            .iter()
            .filter(|c| c.project_id() == project_id && c.variant() == variant)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FederationAttemptStore for InMemoryStore {
    async fn put_attempt(&self, attempt: PendingAttempt) -> Result<(), anyhow::Error> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory attempt mutex poisoned: {}", e))?;
        let now = Utc::now();
        attempts.retain(|_, pending| pending.expires_at > now);
        attempts.insert(attempt.state.clone(), attempt);
        Ok(())
    }

    async fn take_attempt(
        &self,
        project_id: ProjectId,
        state: &str,
    ) -> Result<Option<PendingAttempt>, anyhow::Error> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|e| anyhow::anyhow!("In-memory attempt mutex poisoned: {}", e))?;
        match attempts.get(state) {
            Some(pending) if pending.project_id == project_id => {}
            _ => return Ok(None),
        }
        Ok(attempts
            .remove(state)
            .filter(|pending| pending.expires_at > Utc::now()))
    }
}
