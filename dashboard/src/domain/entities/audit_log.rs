//! Append-only audit trail rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Placement, ReadOnly, Resource, WritePolicy};
use crate::domain::{Role, RoleSet};

/// Roles allowed to read the audit trail.
pub(crate) const AUDIT_READERS: RoleSet = RoleSet::only(Role::President).with(Role::Auditor);

/// Rows returned by the default audit fetch.
pub(crate) const RECENT_AUDIT_LIMIT: usize = 100;

/// One mutation recorded by the backend.
///
/// `action` is kept as the backend's free-form tag (`INSERT`, `UPDATE`,
/// `DELETE`, or anything a trigger writes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Primary key.
    pub id: Uuid,
    /// User whose action was recorded.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Mutation tag.
    pub action: String,
    /// Table the mutation touched.
    pub table_name: String,
    /// Key of the mutated row.
    #[serde(default)]
    pub record_id: Option<String>,
    /// Row before the mutation.
    #[serde(default)]
    pub old_values: Option<Value>,
    /// Row after the mutation.
    #[serde(default)]
    pub new_values: Option<Value>,
    /// Recording time.
    pub created_at: DateTime<Utc>,
}

impl Resource for AuditLogEntry {
    type Draft = ReadOnly;
    type Patch = ReadOnly;

    const TABLE: Table = Table::AuditLogs;
    const NOUN: &'static str = "audit log entry";
    const PLURAL: &'static str = "audit logs";
    const ORDER: OrderBy = OrderBy::descending("created_at");
    const PLACEMENT: Placement = Placement::Prepend;
    const WRITE: WritePolicy = WritePolicy::READ_ONLY;
    const READ: Option<RoleSet> = Some(AUDIT_READERS);
    const FETCH_LIMIT: Option<usize> = Some(RECENT_AUDIT_LIMIT);
    const OWNED: bool = false;

    fn id(&self) -> Uuid {
        self.id
    }
}
