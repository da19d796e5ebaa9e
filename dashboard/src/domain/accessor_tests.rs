//! Tests for the generic resource accessor.

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use serde_json::json;

use super::*;
use crate::domain::audit_dispatch::AuditWorkerReport;
use crate::domain::entities::{
    AuditLogEntry, BudgetAllocation, BudgetAllocationDraft, BudgetAllocationPatch, Event,
    EventDraft, Expense, ExpenseDraft, ExpensePatch, ExpenseStatus, Officer,
};
use crate::domain::ports::{MockTableGateway, NoticeLevel, Table};
use crate::domain::{ErrorCode, Role};
use crate::test_support::{InMemoryTables, RecordingAuditLogger, RecordingNotifier};

struct Harness {
    tables: Arc<InMemoryTables>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn accessor<R: Resource>(&self, role: Option<Role>) -> ResourceAccessor<R> {
        ResourceAccessor::new(
            Session::new(UserId::random(), role),
            self.tables.clone(),
            self.notifier.clone(),
        )
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        tables: Arc::new(InMemoryTables::default()),
        notifier: Arc::new(RecordingNotifier::default()),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn expense_row(title: &str, amount: i64, on: NaiveDate) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": title,
        "amount": amount,
        "category": "Events",
        "expense_date": on.to_string(),
        "status": "pending",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z",
    })
}

fn expense_draft(title: &str, amount: i64) -> ExpenseDraft {
    ExpenseDraft {
        title: title.to_owned(),
        amount: Decimal::from(amount),
        category: "Events".to_owned(),
        description: None,
        expense_date: date(2025, 4, 1),
        receipt_url: None,
        event_id: None,
        status: ExpenseStatus::Pending,
    }
}

fn event_draft(title: &str, on: NaiveDate) -> EventDraft {
    EventDraft {
        title: title.to_owned(),
        description: None,
        event_date: on,
        event_time: None,
        location: None,
        is_public: true,
    }
}

#[rstest]
#[tokio::test]
async fn fetch_all_orders_expenses_newest_first(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("Older", 10, date(2025, 1, 5)));
    harness
        .tables
        .seed(Table::Expenses, expense_row("Newer", 20, date(2025, 2, 5)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::Auditor));
    assert!(accessor.loading());

    accessor.fetch_all().await.expect("fetch succeeds");

    let titles: Vec<&str> = accessor.items().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Newer", "Older"]);
    assert_eq!(accessor.state(), LoadState::Loaded);
}

#[rstest]
#[tokio::test]
async fn failed_fetch_keeps_previous_mirror(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("Kept", 10, date(2025, 1, 5)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    accessor.fetch_all().await.expect("first fetch succeeds");

    harness
        .tables
        .fail_next(TableGatewayError::transport("connection reset"));
    let err = accessor.fetch_all().await.expect_err("second fetch fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(accessor.state(), LoadState::Failed);
    assert_eq!(accessor.items().len(), 1);
    assert_eq!(harness.notifier.errors(), ["Failed to fetch expenses"]);
}

#[rstest]
#[tokio::test]
async fn created_expense_appears_at_the_head(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("Existing", 10, date(2025, 1, 5)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::Secretary));
    accessor.fetch_all().await.expect("fetch succeeds");

    let created = accessor
        .create(&expense_draft("Projector hire", 250))
        .await
        .expect("secretary may add expenses");

    assert_eq!(accessor.items().first().map(|e| e.id), Some(created.id));
    assert_eq!(accessor.items().len(), 2);
    assert_eq!(harness.notifier.successes(), ["Expense added successfully"]);
}

#[rstest]
#[tokio::test]
async fn created_rows_carry_the_session_owner(harness: Harness) {
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    let owner = accessor.session().user_id().to_string();

    accessor
        .create(&expense_draft("Flyers", 40))
        .await
        .expect("create succeeds");

    let stored = harness.tables.rows(Table::Expenses);
    let row = stored.first().expect("row stored");
    assert_eq!(row.get("created_by"), Some(&json!(owner)));
    assert_eq!(row.get("user_id"), Some(&json!(owner)));
}

#[rstest]
#[tokio::test]
async fn budget_allocations_append(harness: Harness) {
    let mut accessor = harness.accessor::<BudgetAllocation>(Some(Role::President));
    for category in ["Events", "Supplies"] {
        accessor
            .create(&BudgetAllocationDraft {
                category: category.to_owned(),
                allocated_amount: Decimal::from(1000),
                fiscal_year: 2025,
            })
            .await
            .expect("create succeeds");
    }

    let categories: Vec<&str> = accessor
        .items()
        .iter()
        .map(|b| b.category.as_str())
        .collect();
    assert_eq!(categories, ["Events", "Supplies"]);
}

#[rstest]
#[tokio::test]
async fn duplicate_budget_category_is_rejected_locally(harness: Harness) {
    let mut accessor = harness.accessor::<BudgetAllocation>(Some(Role::President));
    let draft = BudgetAllocationDraft {
        category: "Events".to_owned(),
        allocated_amount: Decimal::from(1000),
        fiscal_year: 2025,
    };
    accessor.create(&draft).await.expect("first create succeeds");
    let calls = harness.tables.calls();

    let err = accessor.create(&draft).await.expect_err("duplicate rejected");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.tables.calls(), calls);
    assert_eq!(accessor.items().len(), 1);
}

#[rstest]
#[tokio::test]
async fn budget_update_cannot_duplicate_a_category(harness: Harness) {
    let mut accessor = harness.accessor::<BudgetAllocation>(Some(Role::President));
    for category in ["Events", "Supplies"] {
        accessor
            .create(&BudgetAllocationDraft {
                category: category.to_owned(),
                allocated_amount: Decimal::from(1000),
                fiscal_year: 2025,
            })
            .await
            .expect("create succeeds");
    }
    let supplies = accessor
        .items()
        .iter()
        .find(|b| b.category == "Supplies")
        .map(|b| b.id)
        .expect("supplies allocation");
    let calls = harness.tables.calls();

    let patch = BudgetAllocationPatch {
        category: Some("Events".to_owned()),
        ..BudgetAllocationPatch::default()
    };
    let err = accessor
        .update(supplies, &patch)
        .await
        .expect_err("pair already taken");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.tables.calls(), calls);
    let pairs: Vec<(&str, i32)> = accessor
        .items()
        .iter()
        .map(|b| (b.category.as_str(), b.fiscal_year))
        .collect();
    assert_eq!(pairs, [("Events", 2025), ("Supplies", 2025)]);
    assert_eq!(
        harness.notifier.errors(),
        ["Events already has an allocation for 2025"]
    );
}

#[rstest]
#[tokio::test]
async fn events_are_kept_in_date_order(harness: Harness) {
    let mut accessor = harness.accessor::<Event>(Some(Role::Secretary));
    accessor
        .create(&event_draft("Gala", date(2025, 6, 1)))
        .await
        .expect("create succeeds");
    accessor
        .create(&event_draft("Orientation", date(2025, 2, 1)))
        .await
        .expect("create succeeds");
    accessor
        .create(&event_draft("Elections", date(2025, 4, 1)))
        .await
        .expect("create succeeds");

    let titles: Vec<&str> = accessor.items().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Orientation", "Elections", "Gala"]);
}

#[rstest]
#[tokio::test]
async fn secretary_cannot_change_an_expense_amount(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("Catering", 300, date(2025, 3, 1)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::Secretary));
    accessor.fetch_all().await.expect("fetch succeeds");
    let before = accessor.items().to_vec();
    let id = before.first().map(|e| e.id).expect("seeded expense");
    let calls = harness.tables.calls();

    let patch = ExpensePatch {
        amount: Some(Decimal::from(1)),
        ..ExpensePatch::default()
    };
    let err = accessor.update(id, &patch).await.expect_err("denied");

    assert!(err.is_permission_denied());
    assert_eq!(accessor.items(), before.as_slice());
    assert_eq!(harness.tables.calls(), calls);
    assert_eq!(
        harness.notifier.last().map(|n| (n.level, n.message)),
        Some((
            NoticeLevel::Error,
            "Only the President can update expenses".to_owned()
        ))
    );
}

#[rstest]
#[tokio::test]
async fn update_replaces_the_record_in_place(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("First", 10, date(2025, 3, 2)));
    harness
        .tables
        .seed(Table::Expenses, expense_row("Second", 20, date(2025, 3, 1)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    accessor.fetch_all().await.expect("fetch succeeds");
    let id = accessor.items().get(1).map(|e| e.id).expect("second row");

    let patch = ExpensePatch {
        status: Some(ExpenseStatus::Approved),
        ..ExpensePatch::default()
    };
    let updated = accessor.update(id, &patch).await.expect("update succeeds");

    assert_eq!(updated.status, ExpenseStatus::Approved);
    assert_eq!(accessor.items().get(1).map(|e| e.status), Some(ExpenseStatus::Approved));
    assert_eq!(accessor.items().len(), 2);
}

#[rstest]
#[tokio::test]
async fn backend_rejection_leaves_mirror_unchanged(harness: Harness) {
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    harness
        .tables
        .fail_next(TableGatewayError::rejected(409_u16, "duplicate key"));

    let err = accessor
        .create(&expense_draft("Banner", 80))
        .await
        .expect_err("backend rejects");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.details(), Some(&json!({ "status": 409 })));
    assert!(accessor.items().is_empty());
    assert_eq!(harness.notifier.errors(), ["Failed to add expense"]);
}

#[rstest]
#[tokio::test]
async fn delete_removes_the_record(harness: Harness) {
    harness
        .tables
        .seed(Table::Expenses, expense_row("Obsolete", 10, date(2025, 3, 2)));
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    accessor.fetch_all().await.expect("fetch succeeds");
    let id = accessor.items().first().map(|e| e.id).expect("row");

    accessor.delete(id).await.expect("delete succeeds");

    assert!(accessor.find(id).is_none());
    assert!(harness.tables.rows(Table::Expenses).is_empty());
}

#[rstest]
#[case(None)]
#[case(Some(Role::Auditor))]
#[case(Some(Role::Secretary))]
#[tokio::test]
async fn only_presidents_delete_expenses(harness: Harness, #[case] role: Option<Role>) {
    let mut tables = MockTableGateway::new();
    tables.expect_delete().times(0);
    let mut accessor = ResourceAccessor::<Expense>::new(
        Session::new(UserId::random(), role),
        Arc::new(tables),
        harness.notifier.clone(),
    );

    let err = accessor.delete(Uuid::new_v4()).await.expect_err("denied");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn audit_rows_are_hidden_from_secretaries(harness: Harness) {
    let mut tables = MockTableGateway::new();
    tables.expect_select().times(0);
    let mut accessor = ResourceAccessor::<AuditLogEntry>::new(
        Session::new(UserId::random(), Some(Role::Secretary)),
        Arc::new(tables),
        harness.notifier.clone(),
    );

    accessor.fetch_all().await.expect("empty result, not an error");

    assert!(accessor.items().is_empty());
    assert!(harness.notifier.notices().is_empty());
    assert!(!accessor.can_manage());
}

#[rstest]
#[tokio::test]
async fn officer_management_is_president_only(harness: Harness) {
    let president = harness.accessor::<Officer>(Some(Role::President));
    let secretary = harness.accessor::<Officer>(Some(Role::Secretary));

    assert!(president.can_manage());
    assert!(!secretary.can_create());
    assert!(!secretary.can_update());
    assert!(!secretary.can_delete());
}

#[rstest]
#[tokio::test]
async fn successful_mutations_emit_audit_events(harness: Harness) {
    let logger = Arc::new(RecordingAuditLogger::default());
    let (dispatcher, worker) = AuditDispatcher::spawn(logger.clone());
    let mut accessor = harness
        .accessor::<Expense>(Some(Role::President))
        .with_audit(dispatcher);

    let created = accessor
        .create(&expense_draft("Stage", 900))
        .await
        .expect("create succeeds");
    let patch = ExpensePatch {
        title: Some("Stage hire".to_owned()),
        ..ExpensePatch::default()
    };
    accessor.update(created.id, &patch).await.expect("update succeeds");
    accessor.delete(created.id).await.expect("delete succeeds");
    drop(accessor);

    let report = worker.join().await;
    assert_eq!(report, AuditWorkerReport { delivered: 3, failed: 0 });

    let events = logger.events();
    let actions: Vec<AuditAction> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        [AuditAction::Insert, AuditAction::Update, AuditAction::Delete]
    );
    let update = events.get(1).expect("update event");
    assert_eq!(
        update.old_values.as_ref().and_then(|v| v.get("title")),
        Some(&json!("Stage"))
    );
    assert_eq!(
        update.new_values.as_ref().and_then(|v| v.get("title")),
        Some(&json!("Stage hire"))
    );
    assert!(events.last().and_then(|e| e.new_values.as_ref()).is_none());
}

#[rstest]
#[tokio::test]
async fn denied_mutation_never_reaches_the_audit_trail(harness: Harness) {
    let logger = Arc::new(RecordingAuditLogger::default());
    let (dispatcher, worker) = AuditDispatcher::spawn(logger.clone());
    let mut accessor = harness
        .accessor::<Expense>(Some(Role::Auditor))
        .with_audit(dispatcher);

    accessor
        .create(&expense_draft("Snacks", 15))
        .await
        .expect_err("auditors cannot add expenses");
    drop(accessor);

    assert_eq!(worker.join().await, AuditWorkerReport::default());
    assert!(logger.events().is_empty());
}

#[rstest]
#[tokio::test]
async fn audit_failure_does_not_fail_the_mutation(harness: Harness) {
    let logger = Arc::new(RecordingAuditLogger::rejecting());
    let (dispatcher, worker) = AuditDispatcher::spawn(logger);
    let mut accessor = harness
        .accessor::<Expense>(Some(Role::President))
        .with_audit(dispatcher);

    accessor
        .create(&expense_draft("Tickets", 60))
        .await
        .expect("mutation result is independent of auditing");
    drop(accessor);

    assert_eq!(worker.join().await.failed, 1);
    assert_eq!(harness.notifier.errors(), Vec::<String>::new());
}

#[rstest]
#[tokio::test]
async fn unaudited_entities_skip_the_side_channel(harness: Harness) {
    let logger = Arc::new(RecordingAuditLogger::default());
    let (dispatcher, worker) = AuditDispatcher::spawn(logger.clone());
    let mut accessor = harness
        .accessor::<BudgetAllocation>(Some(Role::President))
        .with_audit(dispatcher);

    accessor
        .create(&BudgetAllocationDraft {
            category: "Outreach".to_owned(),
            allocated_amount: Decimal::from(500),
            fiscal_year: 2025,
        })
        .await
        .expect("create succeeds");
    drop(accessor);

    assert_eq!(worker.join().await.delivered, 0);
}

#[rstest]
#[tokio::test]
async fn refetch_picks_up_rows_written_elsewhere(harness: Harness) {
    let mut accessor = harness.accessor::<Expense>(Some(Role::Auditor));
    accessor.fetch_all().await.expect("first fetch");
    assert!(accessor.items().is_empty());

    harness
        .tables
        .seed(Table::Expenses, expense_row("Banner", 40, date(2025, 5, 2)));
    accessor.refetch().await.expect("refetch");

    assert_eq!(accessor.items().len(), 1);
    assert_eq!(accessor.state(), LoadState::Loaded);
}

#[rstest]
fn session_change_resets_the_mirror(harness: Harness) {
    let mut accessor = harness.accessor::<Expense>(Some(Role::President));
    accessor.state = LoadState::Loaded;
    let same_user = Session::new(accessor.session().user_id(), Some(Role::Secretary));

    assert!(!accessor.set_session(same_user));
    assert_eq!(accessor.session().role(), Some(Role::Secretary));
    assert!(accessor.set_session(Session::new(UserId::random(), None)));
    assert!(accessor.loading());
}

fn audit_row() -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "action": "UPDATE",
        "table_name": "expenses",
        "record_id": Uuid::new_v4().to_string(),
        "created_at": "2025-03-01T00:00:00Z",
    })
}

#[rstest]
#[tokio::test]
async fn losing_read_access_clears_the_mirror(harness: Harness) {
    harness.tables.seed(Table::AuditLogs, audit_row());
    let mut accessor = harness.accessor::<AuditLogEntry>(Some(Role::President));
    accessor.fetch_all().await.expect("presidents read the audit trail");
    assert_eq!(accessor.items().len(), 1);

    let demoted = Session::new(accessor.session().user_id(), Some(Role::Secretary));
    assert!(!accessor.set_session(demoted));

    assert!(!accessor.can_read());
    assert!(accessor.items().is_empty());
    assert_eq!(accessor.state(), LoadState::Loaded);
}

#[rstest]
#[tokio::test]
async fn gaining_read_access_requires_a_fetch(harness: Harness) {
    harness.tables.seed(Table::AuditLogs, audit_row());
    let mut accessor = harness.accessor::<AuditLogEntry>(Some(Role::Secretary));
    accessor.fetch_all().await.expect("empty result, not an error");
    assert!(accessor.items().is_empty());

    let promoted = Session::new(accessor.session().user_id(), Some(Role::Auditor));
    assert!(accessor.set_session(promoted));
    assert!(accessor.loading());

    accessor.fetch_all().await.expect("auditors read the audit trail");
    assert_eq!(accessor.items().len(), 1);
}

#[rstest]
#[case(RoleSet::NONE, "view", "audit logs", "Audit logs are read-only")]
#[case(
    RoleSet::only(Role::President).with(Role::Secretary),
    "add",
    "events",
    "Only the President or Secretary can add events"
)]
fn denial_messages_name_the_allow_set(
    #[case] allowed: RoleSet,
    #[case] verb: &str,
    #[case] plural: &str,
    #[case] expected: &str,
) {
    assert_eq!(denial_message(allowed, verb, plural), expected);
}
