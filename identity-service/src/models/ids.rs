//! Strongly typed identifiers.
//!
//! Each entity kind gets its own newtype over [`Uuid`] so ids of different
//! kinds cannot be swapped at compile time. The text form (`Display`,
//! `FromStr`, serde) is always the kind-prefixed base36 rendering from
//! [`crate::codec::identifier`], never the hyphenated UUID.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use crate::codec::{identifier, CodecError, IdKind};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Uuid);

        impl $name {
            pub const KIND: IdKind = $kind;

            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&identifier::format(Self::KIND, self.0))
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                identifier::parse(Self::KIND, s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Tenant (project) identifier. Every other entity is scoped to one.
    ProjectId => IdKind::Project
);
define_id!(OrganizationId => IdKind::Organization);
define_id!(UserId => IdKind::User);
define_id!(RoleId => IdKind::Role);
define_id!(SessionId => IdKind::Session);
define_id!(ApiKeyId => IdKind::ApiKey);
define_id!(BackendApiKeyId => IdKind::BackendApiKey);
define_id!(ScimApiKeyId => IdKind::ScimApiKey);
define_id!(
    /// Short-lived impersonation token record.
    ImpersonationTokenId => IdKind::ImpersonationToken
);
define_id!(OidcConnectionId => IdKind::OidcConnection);
define_id!(SamlConnectionId => IdKind::SamlConnection);
define_id!(
    /// Audit log event. Built from a time-ordered value so events sort by
    /// creation time; see [`crate::utils::time_ordered`].
    AuditLogEventId => IdKind::AuditLogEvent
);
