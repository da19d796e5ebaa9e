//! Budget allocations per category and fiscal year.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{non_negative, optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// Money set aside for one category in one fiscal year.
///
/// ## Invariants
/// - `category` is unique within a fiscal year.
/// - `allocated_amount` is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Primary key.
    pub id: Uuid,
    /// Category name, matched exactly against expenses.
    pub category: String,
    /// Amount set aside.
    #[serde(with = "rust_decimal::serde::float")]
    pub allocated_amount: Decimal,
    /// Fiscal year the allocation applies to.
    pub fiscal_year: i32,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAllocationDraft {
    /// Category name.
    pub category: String,
    /// Amount set aside.
    #[serde(with = "rust_decimal::serde::float")]
    pub allocated_amount: Decimal,
    /// Fiscal year.
    pub fiscal_year: i32,
}

/// Fields replaced in place by an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetAllocationPatch {
    /// New category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New amount.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub allocated_amount: Option<Decimal>,
    /// New fiscal year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
}

/// Reject a `(category, fiscal_year)` pair already held by one of `others`.
fn ensure_unique<'a>(
    others: impl IntoIterator<Item = &'a BudgetAllocation>,
    category: &str,
    fiscal_year: i32,
) -> Result<(), DomainError> {
    let wanted = category.trim();
    let duplicate = others.into_iter().any(|allocation| {
        allocation.fiscal_year == fiscal_year && allocation.category.trim() == wanted
    });
    if duplicate {
        return Err(DomainError::invalid_request(format!(
            "{wanted} already has an allocation for {fiscal_year}"
        ))
        .with_details(json!({ "field": "category" })));
    }
    Ok(())
}

impl Draft<BudgetAllocation> for BudgetAllocationDraft {
    fn validate(&self, existing: &[BudgetAllocation]) -> Result<(), DomainError> {
        required_text("category", &self.category)?;
        non_negative("allocated_amount", self.allocated_amount)?;
        ensure_unique(existing, &self.category, self.fiscal_year)
    }
}

impl Patch<BudgetAllocation> for BudgetAllocationPatch {
    fn validate(&self, id: Uuid, existing: &[BudgetAllocation]) -> Result<(), DomainError> {
        optional_text("category", self.category.as_deref())?;
        if let Some(amount) = self.allocated_amount {
            non_negative("allocated_amount", amount)?;
        }
        if self.category.is_none() && self.fiscal_year.is_none() {
            return Ok(());
        }

        // The resulting pair is the patch laid over the mirrored row.
        let current = existing.iter().find(|allocation| allocation.id == id);
        let category = self
            .category
            .as_deref()
            .or_else(|| current.map(|allocation| allocation.category.as_str()));
        let fiscal_year = self
            .fiscal_year
            .or_else(|| current.map(|allocation| allocation.fiscal_year));
        match (category, fiscal_year) {
            (Some(name), Some(year)) => ensure_unique(
                existing.iter().filter(|allocation| allocation.id != id),
                name,
                year,
            ),
            _ => Ok(()),
        }
    }
}

impl Resource for BudgetAllocation {
    type Draft = BudgetAllocationDraft;
    type Patch = BudgetAllocationPatch;

    const TABLE: Table = Table::BudgetAllocations;
    const NOUN: &'static str = "budget allocation";
    const PLURAL: &'static str = "budget allocations";
    const ORDER: OrderBy = OrderBy::ascending("category");
    const PLACEMENT: Placement = Placement::Append;
    const WRITE: WritePolicy = WritePolicy::uniform(RoleSet::only(Role::President));

    fn id(&self) -> Uuid {
        self.id
    }
}
