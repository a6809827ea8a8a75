pub mod actor;
pub mod error;
pub mod hasher;
pub mod issuer;
pub mod oidc;
pub mod resolver;
pub mod saml;
pub mod store;

pub use actor::{ActorAlternatives, ActorReference, AuditRecorder, AuditSink};
pub use error::{CredentialError, FederationError, SamlError};
pub use hasher::hash_secret;
pub use issuer::{IssuedSecret, SecretIssuer};
pub use oidc::OidcFederationClient;
pub use resolver::{BearerShape, CredentialResolver};
pub use saml::{SamlConnectionManager, SamlConnectionSettings, SamlConnectionView, SpMetadata};
pub use store::{
    ConnectionStore, CredentialStore, FederationAttemptStore, InMemoryStore, SecretDecryptor,
    UserDirectory,
};
