//! Entities mirrored from the hosted backend's tables.
//!
//! Field names follow the backend's snake_case columns so rows round-trip
//! through the untyped table gateway without renaming.

mod announcement;
mod audit_log;
mod budget;
mod document;
mod event;
mod expense;
mod officer;

pub use announcement::{Announcement, AnnouncementDraft, AnnouncementPatch};
pub use audit_log::AuditLogEntry;
pub(crate) use audit_log::AUDIT_READERS;
pub use budget::{BudgetAllocation, BudgetAllocationDraft, BudgetAllocationPatch};
pub use document::{Document, DocumentDraft, DocumentPatch};
pub use event::{Event, EventDraft, EventPatch};
pub use expense::{Expense, ExpenseDraft, ExpensePatch, ExpenseStatus};
pub use officer::{Officer, OfficerDraft, OfficerPatch};

use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::DomainError;

fn required_text(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(
            DomainError::invalid_request(format!("{field} is required"))
                .with_details(json!({ "field": field })),
        );
    }
    Ok(())
}

fn optional_text(field: &'static str, value: Option<&str>) -> Result<(), DomainError> {
    value.map_or(Ok(()), |text| required_text(field, text))
}

fn non_negative(field: &'static str, amount: Decimal) -> Result<(), DomainError> {
    if amount < Decimal::ZERO {
        return Err(
            DomainError::invalid_request(format!("{field} must not be negative"))
                .with_details(json!({ "field": field })),
        );
    }
    Ok(())
}
