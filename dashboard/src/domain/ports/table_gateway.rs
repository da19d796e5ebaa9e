//! Port for row access to the hosted backend's tables.
//!
//! The gateway is deliberately untyped: rows travel as JSON objects and the
//! accessor owns (de)serialisation into entities. One trait object therefore
//! serves every table.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by table gateway adapters.
    pub enum TableGatewayError {
        /// The backend could not be reached or the connection dropped.
        Transport {
            /// Detail reported by the adapter.
            message: String,
        } => "table request failed: {message}",
        /// The backend answered with a non-success status.
        Rejected {
            /// HTTP status returned by the backend.
            status: u16,
            /// Detail reported by the adapter.
            message: String,
        } => "table request rejected with status {status}: {message}",
        /// The response body was not the expected JSON shape.
        Decode {
            /// Detail reported by the adapter.
            message: String,
        } => "table response could not be decoded: {message}",
    }
}

/// Tables exposed by the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `announcements`.
    Announcements,
    /// `audit_logs`.
    AuditLogs,
    /// `budget_allocations`.
    BudgetAllocations,
    /// `documents`.
    Documents,
    /// `events`.
    Events,
    /// `expenses`.
    Expenses,
    /// `officers`.
    Officers,
    /// `profiles`.
    Profiles,
    /// `user_roles`.
    UserRoles,
}

impl Table {
    /// Backend table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Announcements => "announcements",
            Self::AuditLogs => "audit_logs",
            Self::BudgetAllocations => "budget_allocations",
            Self::Documents => "documents",
            Self::Events => "events",
            Self::Expenses => "expenses",
            Self::Officers => "officers",
            Self::Profiles => "profiles",
            Self::UserRoles => "user_roles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed ordering applied to a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Sort column.
    pub column: &'static str,
    /// Sort direction.
    pub ascending: bool,
}

impl OrderBy {
    /// Ascending order on `column`.
    #[must_use]
    pub const fn ascending(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub const fn descending(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// Row filter understood by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column` equals `value`.
    Eq {
        /// Filtered column.
        column: &'static str,
        /// Operand as the backend spells it.
        value: String,
    },
    /// `column` is at least `value`.
    Gte {
        /// Filtered column.
        column: &'static str,
        /// Operand as the backend spells it.
        value: String,
    },
    /// `column` is at most `value`.
    Lte {
        /// Filtered column.
        column: &'static str,
        /// Operand as the backend spells it.
        value: String,
    },
}

impl Filter {
    /// Column the filter applies to.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Eq { column, .. } | Self::Gte { column, .. } | Self::Lte { column, .. } => *column,
        }
    }
}

/// Select request: ordering, optional limit and filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Row ordering.
    pub order: OrderBy,
    /// Row cap, if any.
    pub limit: Option<usize>,
    /// Conditions every returned row meets.
    pub filters: Vec<Filter>,
}

impl SelectQuery {
    /// Select every row in `order`.
    #[must_use]
    pub const fn ordered(order: OrderBy) -> Self {
        Self {
            order,
            limit: None,
            filters: Vec::new(),
        }
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.into(),
        });
        self
    }

    /// Keep rows where `column` is at least `value`.
    #[must_use]
    pub fn gte(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Gte {
            column,
            value: value.into(),
        });
        self
    }

    /// Keep rows where `column` is at most `value`.
    #[must_use]
    pub fn lte(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Lte {
            column,
            value: value.into(),
        });
        self
    }
}

/// Port for CRUD access to one backend table at a time.
///
/// Inserts and updates return the stored row as the backend sees it, with
/// server-populated columns (`id`, `created_at`, `updated_at`) filled in.
/// Concurrent writers are not detected: the last write wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// Fetch rows matching `query`.
    async fn select(&self, table: Table, query: &SelectQuery)
    -> Result<Vec<Value>, TableGatewayError>;

    /// Insert one row and return the stored representation.
    async fn insert(&self, table: Table, row: &Value) -> Result<Value, TableGatewayError>;

    /// Apply `changes` to the row keyed by `id` and return the stored
    /// representation.
    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: &Value,
    ) -> Result<Value, TableGatewayError>;

    /// Permanently delete the row keyed by `id`.
    async fn delete(&self, table: Table, id: Uuid) -> Result<(), TableGatewayError>;
}
