//! Who a request is acting as.
//!
//! [`VerifiedPrincipal`] can only be produced by the credential resolver
//! after a successful hash match; [`AttributionOnlyPrincipal`] comes from an
//! unverified compact token and is good for audit attribution only. Neither
//! converts into the other.

use serde::{Deserialize, Serialize};

use crate::models::{
    CredentialId, CredentialKind, OrganizationId, ProjectId, SessionId, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedPrincipal {
    credential_id: CredentialId,
    project_id: ProjectId,
    organization_id: Option<OrganizationId>,
    user_id: Option<UserId>,
    actions: Vec<String>,
}

impl VerifiedPrincipal {
    pub(crate) fn new(
        credential_id: CredentialId,
        project_id: ProjectId,
        organization_id: Option<OrganizationId>,
        user_id: Option<UserId>,
        mut actions: Vec<String>,
    ) -> Self {
        if credential_id.kind().carries_actions() {
            actions.sort();
        }
        Self {
            credential_id,
            project_id,
            organization_id,
            user_id,
            actions,
        }
    }

    pub fn credential_kind(&self) -> CredentialKind {
        self.credential_id.kind()
    }

    pub fn credential_id(&self) -> CredentialId {
        self.credential_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Sorted for API key kinds.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn has_action(&self, action: &str) -> bool {
        if self.credential_kind().carries_actions() {
            self.actions
                .binary_search_by(|a| a.as_str().cmp(action))
                .is_ok()
        } else {
            self.actions.iter().any(|a| a == action)
        }
    }
}

/// Claims read, unverified, from a compact token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionOnlyPrincipal {
    pub project_id: ProjectId,
    pub organization_id: Option<OrganizationId>,
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
}

/// Result of [`crate::services::CredentialResolver::resolve_for_attribution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Verified(VerifiedPrincipal),
    Unverified(AttributionOnlyPrincipal),
}

/// The actor recorded against an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    User { user_id: UserId },
    Session { session_id: SessionId },
    ApiKey { credential_id: CredentialId },
    Credential { principal: VerifiedPrincipal },
    Unverified { principal: AttributionOnlyPrincipal },
}
