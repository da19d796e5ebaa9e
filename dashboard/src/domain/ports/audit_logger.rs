//! Port for the backend's audit-log remote procedure.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::Table;
use super::define_port_error;

define_port_error! {
    /// Errors raised by audit logger adapters.
    pub enum AuditLoggerError {
        /// The procedure call could not be delivered.
        Transport {
            /// Detail reported by the adapter.
            message: String,
        } => "audit call failed: {message}",
        /// The backend refused the call.
        Rejected {
            /// HTTP status returned by the backend.
            status: u16,
            /// Detail reported by the adapter.
            message: String,
        } => "audit call rejected with status {status}: {message}",
    }
}

/// Mutation kind recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// A row was created.
    Insert,
    /// A row was changed.
    Update,
    /// A row was removed.
    Delete,
}

impl AuditAction {
    /// Action tag as stored by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record describing a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Mutation kind.
    pub action: AuditAction,
    /// Table the mutation touched.
    pub table: Table,
    /// Key of the mutated row.
    pub record_id: Uuid,
    /// Row as it was before the mutation, when known.
    pub old_values: Option<Value>,
    /// Row as stored after the mutation.
    pub new_values: Option<Value>,
}

/// Port for writing audit records.
///
/// Calls are made off the mutation path; implementations may fail without
/// affecting the mutation that triggered them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Record `event` in the audit trail.
    async fn log_audit_event(&self, event: &AuditEvent) -> Result<(), AuditLoggerError>;
}
