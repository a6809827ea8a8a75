//! OIDC federation: discovery, PKCE, code exchange and ID token
//! verification.

pub mod discovery;
pub mod flow;
pub mod jwks;
pub mod pkce;
pub mod verifier;

pub use discovery::{ClientAuthMethod, ProviderMetadata};
pub use flow::{
    redirect_uri, AuthorizationRequest, CallbackParams, FederatedIdentity, OidcFederationClient,
    PendingAttempt,
};
pub use jwks::{Jwk, JwkSet};
pub use verifier::{verify_id_token, ExpectedClaims, IdTokenClaims};
