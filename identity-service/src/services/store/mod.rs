//! Storage collaborators.
//!
//! Every method takes the tenant explicitly; implementations must never
//! return a row that belongs to another project.

pub mod memory;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::models::{
    ConnectionId, ConnectionVariant, CredentialId, CredentialKind, CredentialRecord,
    EncryptedSecret, FederatedConnection, ProjectId, SecretHash, UserId,
};
use crate::services::oidc::PendingAttempt;

pub use memory::InMemoryStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_credential(&self, record: CredentialRecord) -> Result<(), anyhow::Error>;

    /// Record of `kind` in `project_id` whose stored hash equals `hash`.
    /// Revoked records have no hash and therefore never match.
    async fn find_by_hash(
        &self,
        project_id: ProjectId,
        kind: CredentialKind,
        hash: &SecretHash,
    ) -> Result<Option<CredentialRecord>, anyhow::Error>;

    async fn get_credential(
        &self,
        project_id: ProjectId,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, anyhow::Error>;

    /// Clear the stored hash. Returns `false` when no such record exists.
    async fn revoke(&self, project_id: ProjectId, id: CredentialId) -> Result<bool, anyhow::Error>;
}

/// Existence checks against the user directory, which lives outside this
/// crate.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, project_id: ProjectId, user_id: UserId)
        -> Result<bool, anyhow::Error>;
}

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert or replace. When the saved connection is primary, every other
    /// connection of the same project and variant loses the flag in the same
    /// write.
    async fn save_connection(&self, connection: FederatedConnection) -> Result<(), anyhow::Error>;

    async fn get_connection(
        &self,
        project_id: ProjectId,
        id: ConnectionId,
    ) -> Result<Option<FederatedConnection>, anyhow::Error>;

    /// Make `id` the project's primary connection of its variant. Returns
    /// `false` when no such connection exists.
    async fn set_primary(&self, project_id: ProjectId, id: ConnectionId)
        -> Result<bool, anyhow::Error>;

    async fn primary_connection(
        &self,
        project_id: ProjectId,
        variant: ConnectionVariant,
    ) -> Result<Option<FederatedConnection>, anyhow::Error>;

    async fn list_connections(
        &self,
        project_id: ProjectId,
        variant: ConnectionVariant,
    ) -> Result<Vec<FederatedConnection>, anyhow::Error>;
}

/// Pending OIDC attempts, keyed by the `state` sent to the provider.
///
/// Implementations must honour `PendingAttempt::expires_at`: an expired
/// attempt is never returned and is eventually discarded, whether or not
/// its callback ever arrives.
#[async_trait]
pub trait FederationAttemptStore: Send + Sync {
    async fn put_attempt(&self, attempt: PendingAttempt) -> Result<(), anyhow::Error>;

    /// Remove and return the live attempt for `state` in `project_id`. A
    /// state can be taken once. An attempt belonging to another project is
    /// left in place.
    async fn take_attempt(
        &self,
        project_id: ProjectId,
        state: &str,
    ) -> Result<Option<PendingAttempt>, anyhow::Error>;
}

/// Envelope decryption of OIDC client secrets.
#[async_trait]
pub trait SecretDecryptor: Send + Sync {
    async fn decrypt(
        &self,
        project_id: ProjectId,
        secret: &EncryptedSecret,
    ) -> Result<SecretString, anyhow::Error>;
}
