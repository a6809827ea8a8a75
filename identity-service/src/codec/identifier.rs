//! Kind-prefixed identifiers, e.g. `user_0kz3...`.
//!
//! Every id leaving the vault names its entity kind, so a role id sent
//! where a user id is expected fails to parse instead of matching a row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{alphabet, decode_body, split_body, CodecError};

/// Symbols needed for any 128-bit value.
pub const IDENTIFIER_WIDTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Project,
    Organization,
    User,
    Role,
    Session,
    ApiKey,
    BackendApiKey,
    ScimApiKey,
    ImpersonationToken,
    OidcConnection,
    SamlConnection,
    AuditLogEvent,
}

impl IdKind {
    pub const ALL: [IdKind; 12] = [
        IdKind::Project,
        IdKind::Organization,
        IdKind::User,
        IdKind::Role,
        IdKind::Session,
        IdKind::ApiKey,
        IdKind::BackendApiKey,
        IdKind::ScimApiKey,
        IdKind::ImpersonationToken,
        IdKind::OidcConnection,
        IdKind::SamlConnection,
        IdKind::AuditLogEvent,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Project => "project_",
            IdKind::Organization => "org_",
            IdKind::User => "user_",
            IdKind::Role => "role_",
            IdKind::Session => "session_",
            IdKind::ApiKey => "api_key_",
            IdKind::BackendApiKey => "backend_api_key_",
            IdKind::ScimApiKey => "scim_api_key_",
            IdKind::ImpersonationToken => "impersonation_token_",
            IdKind::OidcConnection => "oidc_connection_",
            IdKind::SamlConnection => "saml_connection_",
            IdKind::AuditLogEvent => "audit_log_event_",
        }
    }

    /// Kind from its prefix without the trailing underscore, e.g. `org`.
    pub fn from_name(name: &str) -> Option<IdKind> {
        IdKind::ALL
            .into_iter()
            .find(|kind| kind.prefix().trim_end_matches('_') == name)
    }

    fn label(&self) -> &'static str {
        match self {
            IdKind::Project => "project id",
            IdKind::Organization => "organization id",
            IdKind::User => "user id",
            IdKind::Role => "role id",
            IdKind::Session => "session id",
            IdKind::ApiKey => "api key id",
            IdKind::BackendApiKey => "backend api key id",
            IdKind::ScimApiKey => "scim api key id",
            IdKind::ImpersonationToken => "impersonation token id",
            IdKind::OidcConnection => "oidc connection id",
            IdKind::SamlConnection => "saml connection id",
            IdKind::AuditLogEvent => "audit log event id",
        }
    }
}

pub fn format(kind: IdKind, value: Uuid) -> String {
    let mut out = String::with_capacity(kind.prefix().len() + IDENTIFIER_WIDTH);
    out.push_str(kind.prefix());
    out.push_str(&alphabet::encode_fixed(
        &value.as_u128().to_be_bytes(),
        IDENTIFIER_WIDTH,
    ));
    out
}

pub fn parse(kind: IdKind, text: &str) -> Result<Uuid, CodecError> {
    let what = kind.label();
    let body = split_body(what, kind.prefix(), IDENTIFIER_WIDTH, text)?;
    let bytes = decode_body::<16>(what, kind.prefix(), body)?;
    Ok(Uuid::from_u128(u128::from_be_bytes(bytes)))
}
