//! Recorded expenses and their approval status.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_negative, optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// Approval state of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Accepted by the President.
    Approved,
    /// Refused by the President.
    Rejected,
}

/// Money spent against a budget category.
///
/// `category` is free text. It is expected to match a
/// [`super::BudgetAllocation`] category but nothing enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Primary key.
    pub id: Uuid,
    /// Short description.
    pub title: String,
    /// Amount spent.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Budget category charged.
    pub category: String,
    /// Free-form notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Day the money was spent.
    pub expense_date: NaiveDate,
    /// Public URL of the uploaded receipt.
    #[serde(default)]
    pub receipt_url: Option<String>,
    /// Event the expense belongs to.
    #[serde(default)]
    pub event_id: Option<Uuid>,
    /// Approval state.
    #[serde(default)]
    pub status: ExpenseStatus,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Officer who recorded it.
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Fields supplied when recording an expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDraft {
    /// Short description.
    pub title: String,
    /// Amount spent.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Budget category charged.
    pub category: String,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Day the money was spent.
    pub expense_date: NaiveDate,
    /// Public URL of the uploaded receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// Event the expense belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    /// Initial approval state.
    pub status: ExpenseStatus,
}

/// Partial expense update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpensePatch {
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New amount.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_date: Option<NaiveDate>,
    /// New receipt URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// New linked event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    /// New approval state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExpenseStatus>,
}

impl ExpensePatch {
    /// Whether the patch changes money, category or approval.
    #[must_use]
    pub const fn touches_financials(&self) -> bool {
        self.amount.is_some() || self.category.is_some() || self.status.is_some()
    }
}

const PRESIDENT: RoleSet = RoleSet::only(Role::President);
const PRESIDENT_OR_SECRETARY: RoleSet = PRESIDENT.with(Role::Secretary);

impl Draft<Expense> for ExpenseDraft {
    fn validate(&self, _existing: &[Expense]) -> Result<(), DomainError> {
        required_text("title", &self.title)?;
        required_text("category", &self.category)?;
        non_negative("amount", self.amount)
    }
}

impl Patch<Expense> for ExpensePatch {
    fn validate(&self, _id: Uuid, _existing: &[Expense]) -> Result<(), DomainError> {
        optional_text("title", self.title.as_deref())?;
        optional_text("category", self.category.as_deref())?;
        self.amount
            .map_or(Ok(()), |amount| non_negative("amount", amount))
    }
}

impl Resource for Expense {
    type Draft = ExpenseDraft;
    type Patch = ExpensePatch;

    const TABLE: Table = Table::Expenses;
    const NOUN: &'static str = "expense";
    const PLURAL: &'static str = "expenses";
    const ORDER: OrderBy = OrderBy::descending("expense_date");
    const PLACEMENT: Placement = Placement::Prepend;
    const WRITE: WritePolicy = WritePolicy {
        create: PRESIDENT_OR_SECRETARY,
        update: PRESIDENT_OR_SECRETARY,
        delete: PRESIDENT,
    };
    const AUDITED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn update_roles(patch: &ExpensePatch) -> RoleSet {
        if patch.touches_financials() {
            PRESIDENT
        } else {
            Self::WRITE.update
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ExpensePatch { amount: Some(Decimal::from(10)), ..ExpensePatch::default() })]
    #[case(ExpensePatch { category: Some("Events".to_owned()), ..ExpensePatch::default() })]
    #[case(ExpensePatch { status: Some(ExpenseStatus::Approved), ..ExpensePatch::default() })]
    fn financial_patches_need_president(#[case] patch: ExpensePatch) {
        let roles = Expense::update_roles(&patch);
        assert!(roles.contains(Role::President));
        assert!(!roles.contains(Role::Secretary));
    }

    #[rstest]
    fn descriptive_patches_admit_secretary() {
        let patch = ExpensePatch {
            receipt_url: Some("https://files.example/receipt.png".to_owned()),
            ..ExpensePatch::default()
        };
        assert!(Expense::update_roles(&patch).contains(Role::Secretary));
    }

    #[rstest]
    fn status_defaults_to_pending_when_missing() {
        let row = json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "title": "Venue deposit",
            "amount": 1500.5,
            "category": "Events",
            "expense_date": "2025-03-14",
            "created_at": "2025-03-14T09:00:00Z",
            "updated_at": "2025-03-14T09:00:00Z",
        });
        let expense: Expense = serde_json::from_value(row).expect("row decodes");
        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert_eq!(expense.amount, Decimal::new(15005, 1));
    }

    #[rstest]
    fn draft_rejects_missing_title() {
        let draft = ExpenseDraft {
            title: "  ".to_owned(),
            amount: Decimal::ONE,
            category: "Supplies".to_owned(),
            description: None,
            expense_date: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            receipt_url: None,
            event_id: None,
            status: ExpenseStatus::Pending,
        };
        let err = draft.validate(&[]).expect_err("blank title");
        assert_eq!(err.message(), "title is required");
    }
}
