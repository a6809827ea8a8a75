pub mod audit;
pub mod connection;
pub mod credential;
pub mod ids;
pub mod principal;
pub mod tenant;

pub use audit::AuditEntry;
pub use connection::{
    CertificateError, ConnectionId, ConnectionVariant, EncryptedSecret, FederatedConnection,
    IdpCertificate, OidcConnection, SamlConnection,
};
pub use credential::{CredentialId, CredentialKind, CredentialRecord, SecretHash};
pub use ids::{
    ApiKeyId, AuditLogEventId, BackendApiKeyId, ImpersonationTokenId, OidcConnectionId,
    OrganizationId, ProjectId, RoleId, SamlConnectionId, ScimApiKeyId, SessionId, UserId,
};
pub use principal::{Actor, Attribution, AttributionOnlyPrincipal, VerifiedPrincipal};
pub use tenant::{SecretPrefixes, TenantScope, TenantScopeError};
