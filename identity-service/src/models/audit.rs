//! Audit entry model - attribution of an action to a resolved actor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Actor, AuditLogEventId, ProjectId};
use crate::utils::time_ordered::{self, TimeOrderedIdError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub event_id: AuditLogEventId,
    pub project_id: ProjectId,
    pub actor: Actor,
    /// Short machine name of the action, e.g. `api_key_created`.
    pub event_type: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// The event id carries `created_at` in its leading bits, so entries
    /// sort by time on id alone.
    pub fn new(
        project_id: ProjectId,
        actor: Actor,
        event_type: impl Into<String>,
        details: Option<serde_json::Value>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TimeOrderedIdError> {
        Ok(Self {
            event_id: AuditLogEventId::from_uuid(time_ordered::construct_at(created_at)?),
            project_id,
            actor,
            event_type: event_type.into(),
            details,
            created_at,
        })
    }
}
