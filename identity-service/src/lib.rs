//! identity-service: credential, identifier and federation core of the
//! multi-tenant identity vault.
//!
//! Mints and parses prefixed identifiers and bearer secrets, resolves bearer
//! credentials to principals within a tenant, and federates login to
//! external OIDC and SAML identity providers.

pub mod codec;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use codec::{CodecError, IdKind};
pub use config::{FederationConfig, IdentityConfig};
pub use models::{
    Attribution, AttributionOnlyPrincipal, CredentialKind, TenantScope, VerifiedPrincipal,
};
pub use services::{
    AuditRecorder, CredentialError, CredentialResolver, FederationError, OidcFederationClient,
    SamlConnectionManager, SamlError, SecretIssuer,
};
pub use utils::{Page, PageCursor, PaginationError, RequestContext};
