//! Read-side queries over the audit trail.
//!
//! The trail is read through the generic accessor for [`AuditLogEntry`]. The
//! narrower queries below return fresh result sets and leave the accessor's
//! mirror (the most recent entries) untouched.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::DomainError;
use crate::domain::accessor::{Operation, ResourceAccessor};
use crate::domain::entities::{AUDIT_READERS, AuditLogEntry};
use crate::domain::ports::{SelectQuery, Table};
use crate::domain::resource::Resource;

/// Rows returned by [`ResourceAccessor::by_table`].
pub const TABLE_HISTORY_LIMIT: usize = 50;

impl ResourceAccessor<AuditLogEntry> {
    /// Newest entries across every table, refreshing the mirror.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend failure.
    pub async fn recent(&mut self) -> Result<&[AuditLogEntry], DomainError> {
        self.fetch_all().await?;
        Ok(self.items())
    }

    /// Newest entries for one table.
    ///
    /// Sessions outside the read roles get an empty list.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend failure.
    pub async fn by_table(&self, table: Table) -> Result<Vec<AuditLogEntry>, DomainError> {
        if !self.can_read() {
            return Ok(Vec::new());
        }
        let query = SelectQuery::ordered(AuditLogEntry::ORDER)
            .eq("table_name", table.as_str())
            .limit(TABLE_HISTORY_LIMIT);
        self.history(&query).await
    }

    /// Every entry recorded for one row.
    ///
    /// Sessions outside the read roles get an empty list.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend failure.
    pub async fn by_record(
        &self,
        table: Table,
        record_id: &str,
    ) -> Result<Vec<AuditLogEntry>, DomainError> {
        if !self.can_read() {
            return Ok(Vec::new());
        }
        let query = SelectQuery::ordered(AuditLogEntry::ORDER)
            .eq("table_name", table.as_str())
            .eq("record_id", record_id);
        self.history(&query).await
    }

    /// Entries created within `start..=end`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] (with a notice) when
    /// the session may not read the trail,
    /// [`crate::domain::ErrorCode::InvalidRequest`] when `start` is after
    /// `end`, or the mapped backend failure.
    pub async fn report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEntry>, DomainError> {
        if !self.can_read() {
            self.deny(AUDIT_READERS, "view", "audit reports")?;
        }
        if start > end {
            return Err(DomainError::invalid_request("report start must not be after its end")
                .with_details(json!({
                    "start": start.to_rfc3339(),
                    "end": end.to_rfc3339(),
                })));
        }
        let query = SelectQuery::ordered(AuditLogEntry::ORDER)
            .gte("created_at", start.to_rfc3339())
            .lte("created_at", end.to_rfc3339());
        self.history(&query).await
    }

    async fn history(&self, query: &SelectQuery) -> Result<Vec<AuditLogEntry>, DomainError> {
        match self.query(query).await {
            Ok(entries) => Ok(entries),
            Err(error) => Err(self.report_failure(Operation::Fetch, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::domain::ports::{Filter, MockTableGateway, Notifier, TableGateway};
    use crate::domain::{ErrorCode, Role, Session, UserId};
    use crate::test_support::{InMemoryTables, RecordingNotifier};

    fn entry(table: &str, record_id: &str, created_at: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "user_id": Uuid::new_v4().to_string(),
            "action": "UPDATE",
            "table_name": table,
            "record_id": record_id,
            "created_at": created_at,
        })
    }

    fn trail(
        role: Option<Role>,
        tables: Arc<dyn TableGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> ResourceAccessor<AuditLogEntry> {
        ResourceAccessor::new(Session::new(UserId::random(), role), tables, notifier)
    }

    #[rstest]
    #[tokio::test]
    async fn recent_caps_at_one_hundred_newest_entries() {
        let tables = Arc::new(InMemoryTables::default());
        let start = Utc
            .with_ymd_and_hms(2025, 3, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        for second in 0..120 {
            let at = start + TimeDelta::seconds(second);
            tables.seed(Table::AuditLogs, entry("expenses", "r", &at.to_rfc3339()));
        }
        let mut accessor = trail(
            Some(Role::Auditor),
            tables,
            Arc::new(RecordingNotifier::default()),
        );

        let recent = accessor.recent().await.expect("fetch succeeds");

        assert_eq!(recent.len(), 100);
        let first = recent.first().map(|e| e.created_at);
        let last = recent.last().map(|e| e.created_at);
        assert!(first > last);
    }

    #[rstest]
    #[tokio::test]
    async fn by_table_filters_and_limits() {
        let mut tables = MockTableGateway::new();
        tables
            .expect_select()
            .withf(|table, query| {
                *table == Table::AuditLogs
                    && query.limit == Some(TABLE_HISTORY_LIMIT)
                    && query.filters
                        == [Filter::Eq {
                            column: "table_name",
                            value: "events".to_owned(),
                        }]
            })
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let accessor = trail(
            Some(Role::President),
            Arc::new(tables),
            Arc::new(RecordingNotifier::default()),
        );

        let entries = accessor.by_table(Table::Events).await.expect("query succeeds");
        assert!(entries.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn by_record_matches_table_and_record() {
        let tables = Arc::new(InMemoryTables::default());
        tables.seed(Table::AuditLogs, entry("expenses", "abc", "2025-03-01T10:00:00Z"));
        tables.seed(Table::AuditLogs, entry("expenses", "xyz", "2025-03-01T11:00:00Z"));
        tables.seed(Table::AuditLogs, entry("events", "abc", "2025-03-01T12:00:00Z"));
        let accessor = trail(
            Some(Role::Auditor),
            tables,
            Arc::new(RecordingNotifier::default()),
        );

        let entries = accessor
            .by_record(Table::Expenses, "abc")
            .await
            .expect("query succeeds");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|e| e.table_name.as_str()), Some("expenses"));
    }

    #[rstest]
    #[tokio::test]
    async fn secretary_reads_nothing_silently() {
        let mut tables = MockTableGateway::new();
        tables.expect_select().times(0);
        let notifier = Arc::new(RecordingNotifier::default());
        let accessor = trail(Some(Role::Secretary), Arc::new(tables), notifier.clone());

        let entries = accessor.by_table(Table::Expenses).await.expect("empty");

        assert!(entries.is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn report_denial_is_announced() {
        let mut tables = MockTableGateway::new();
        tables.expect_select().times(0);
        let notifier = Arc::new(RecordingNotifier::default());
        let accessor = trail(None, Arc::new(tables), notifier.clone());
        let now = Utc::now();

        let err = accessor.report(now, now).await.expect_err("denied");

        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(
            notifier.errors(),
            ["Only the President or Auditor can view audit reports"]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn report_rejects_inverted_range() {
        let accessor = trail(
            Some(Role::Auditor),
            Arc::new(InMemoryTables::default()),
            Arc::new(RecordingNotifier::default()),
        );
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).single().expect("valid");
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).single().expect("valid");

        let err = accessor.report(start, end).await.expect_err("inverted");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn report_keeps_entries_inside_the_window() {
        let tables = Arc::new(InMemoryTables::default());
        tables.seed(Table::AuditLogs, entry("expenses", "a", "2025-02-28T23:59:59+00:00"));
        tables.seed(Table::AuditLogs, entry("expenses", "b", "2025-03-10T08:00:00+00:00"));
        tables.seed(Table::AuditLogs, entry("expenses", "c", "2025-04-02T00:00:00+00:00"));
        let accessor = trail(
            Some(Role::President),
            tables,
            Arc::new(RecordingNotifier::default()),
        );
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).single().expect("valid");
        let end = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).single().expect("valid");

        let entries = accessor.report(start, end).await.expect("report succeeds");
        let ids: Vec<Option<&str>> = entries.iter().map(|e| e.record_id.as_deref()).collect();
        assert_eq!(ids, [Some("b")]);
    }
}
