//! In-memory doubles for the dashboard ports.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{
    AuditEvent, AuditLogger, AuditLoggerError, Filter, Notice, NoticeLevel, Notifier,
    SelectQuery, Table, TableGateway, TableGatewayError,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> std::sync::MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{what} mutex poisoned"),
    }
}

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance_millis(&self, millis: i64) {
        *lock(&self.0, "clock") += TimeDelta::milliseconds(millis);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Notifier that keeps every notice it receives.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notice>>);

impl RecordingNotifier {
    /// Every notice, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.0, "notifier").clone()
    }

    /// Messages of error notices.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages(NoticeLevel::Error)
    }

    /// Messages of success notices.
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        self.messages(NoticeLevel::Success)
    }

    /// Most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        lock(&self.0, "notifier").last().cloned()
    }

    fn messages(&self, level: NoticeLevel) -> Vec<String> {
        lock(&self.0, "notifier")
            .iter()
            .filter(|notice| notice.level == level)
            .map(|notice| notice.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.0, "notifier").push(notice);
    }
}

/// Audit logger that records events and optionally rejects them.
#[derive(Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<AuditEvent>>,
    reject: bool,
}

impl RecordingAuditLogger {
    /// Logger that records and then rejects every event.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            events: Mutex::default(),
            reject: true,
        }
    }

    /// Every event received, including rejected ones.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        lock(&self.events, "audit logger").clone()
    }
}

#[async_trait]
impl AuditLogger for RecordingAuditLogger {
    async fn log_audit_event(&self, event: &AuditEvent) -> Result<(), AuditLoggerError> {
        lock(&self.events, "audit logger").push(event.clone());
        if self.reject {
            return Err(AuditLoggerError::rejected(500_u16, "audit procedure unavailable"));
        }
        Ok(())
    }
}

/// Table gateway backed by in-process JSON rows.
///
/// Mimics the hosted backend closely enough for accessor tests: inserts get
/// an `id` and timestamps, updates merge fields, selects honour filters,
/// ordering and limits. Every call is counted so tests can assert that a
/// denied operation never reached the backend.
#[derive(Default)]
pub struct InMemoryTables {
    rows: Mutex<HashMap<Table, Vec<Value>>>,
    calls: AtomicUsize,
    next_failure: Mutex<Option<TableGatewayError>>,
}

impl InMemoryTables {
    /// Store `row` in `table` as-is.
    pub fn seed(&self, table: Table, row: Value) {
        lock(&self.rows, "tables").entry(table).or_default().push(row);
    }

    /// Snapshot of the rows held for `table`, in storage order.
    #[must_use]
    pub fn rows(&self, table: Table) -> Vec<Value> {
        lock(&self.rows, "tables")
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of gateway calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: TableGatewayError) {
        *lock(&self.next_failure, "tables") = Some(error);
    }

    fn begin_call(&self) -> Result<(), TableGatewayError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        lock(&self.next_failure, "tables").take().map_or(Ok(()), Err)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match (filter, row.get(filter.column()).and_then(text_of)) {
        (Filter::Eq { value, .. }, Some(field)) => field == *value,
        (Filter::Gte { value, .. }, Some(field)) => field.as_str() >= value.as_str(),
        (Filter::Lte { value, .. }, Some(field)) => field.as_str() <= value.as_str(),
        (_, None) => false,
    }
}

fn compare_field(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => text_of(a).cmp(&text_of(b)),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl TableGateway for InMemoryTables {
    async fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, TableGatewayError> {
        self.begin_call()?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|filter| matches(row, filter)))
            .collect();
        let column = query.order.column;
        rows.sort_by(|a, b| {
            let ordering = compare_field(a.get(column), b.get(column));
            if query.order.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: &Value) -> Result<Value, TableGatewayError> {
        self.begin_call()?;
        let Value::Object(mut fields) = row.clone() else {
            return Err(TableGatewayError::rejected(400_u16, "row must be an object"));
        };
        let now = Value::String(Utc::now().to_rfc3339());
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields.entry("created_at").or_insert_with(|| now.clone());
        fields.entry("updated_at").or_insert(now);
        let stored = Value::Object(fields);
        self.seed(table, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: &Value,
    ) -> Result<Value, TableGatewayError> {
        self.begin_call()?;
        let key = id.to_string();
        let mut tables = lock(&self.rows, "tables");
        let stored = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(key.as_str())))
            .ok_or_else(|| TableGatewayError::rejected(406_u16, "no rows returned"))?;
        if let (Value::Object(target), Value::Object(patch)) = (&mut *stored, changes) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
            target.insert(
                "updated_at".to_owned(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        Ok(stored.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), TableGatewayError> {
        self.begin_call()?;
        let key = id.to_string();
        if let Some(rows) = lock(&self.rows, "tables").get_mut(&table) {
            rows.retain(|row| row_id(row) != Some(key.as_str()));
        }
        Ok(())
    }
}
