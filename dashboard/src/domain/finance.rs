//! Budget and expense aggregation.
//!
//! Every function here is a pure reduction over already-fetched
//! collections: no I/O, no caching, no mutation of the inputs. Amounts are
//! exact decimals; percentages are decimals on a 0-100 scale.
//!
//! # Examples
//! ```
//! use rust_decimal::Decimal;
//! use sbo_dashboard::domain::finance::{RiskTier, remaining, utilization_percent};
//!
//! let allocated = Decimal::from(10_000);
//! let spent = Decimal::from(9_500);
//! let utilization = utilization_percent(spent, allocated);
//! assert_eq!(utilization, Decimal::from(95));
//! assert_eq!(RiskTier::classify(utilization), RiskTier::High);
//! assert_eq!(remaining(allocated, spent), Decimal::from(500));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::{BudgetAllocation, Expense, ExpenseStatus};

/// Which expenses count toward spend.
///
/// The dashboards have always summed every expense regardless of approval
/// state. `ApprovedOnly` excludes pending and rejected expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendBasis {
    /// Every expense counts.
    #[default]
    AllStatuses,
    /// Only approved expenses count.
    ApprovedOnly,
}

impl SpendBasis {
    /// Basis selected by the `approved_only_spend` setting.
    #[must_use]
    pub const fn from_approved_only(approved_only: bool) -> Self {
        if approved_only {
            Self::ApprovedOnly
        } else {
            Self::AllStatuses
        }
    }

    /// Whether an expense in `status` counts toward spend.
    #[must_use]
    pub const fn counts(self, status: ExpenseStatus) -> bool {
        match self {
            Self::AllStatuses => true,
            Self::ApprovedOnly => matches!(status, ExpenseStatus::Approved),
        }
    }
}

const HIGH_RISK_ABOVE: Decimal = Decimal::from_parts(90, 0, 0, false, 0);
const MEDIUM_RISK_ABOVE: Decimal = Decimal::from_parts(70, 0, 0, false, 0);

/// Three-tier utilization risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Utilization at or below 70%.
    Low,
    /// Utilization above 70% and at most 90%.
    Medium,
    /// Utilization above 90%.
    High,
}

impl RiskTier {
    /// Classify a utilization percentage.
    ///
    /// Thresholds are strict: exactly 90 is medium and exactly 70 is low.
    #[must_use]
    pub fn classify(utilization: Decimal) -> Self {
        if utilization > HIGH_RISK_ABOVE {
            Self::High
        } else if utilization > MEDIUM_RISK_ABOVE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lower-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum of every allocation.
#[must_use]
pub fn total_allocated(budgets: &[BudgetAllocation]) -> Decimal {
    budgets.iter().map(|budget| budget.allocated_amount).sum()
}

/// Sum of the expenses counted by `basis`.
#[must_use]
pub fn total_spent(expenses: &[Expense], basis: SpendBasis) -> Decimal {
    counted(expenses, basis).map(|expense| expense.amount).sum()
}

/// Spend in one category, matched by exact string equality.
#[must_use]
pub fn spent_in_category(expenses: &[Expense], category: &str, basis: SpendBasis) -> Decimal {
    counted(expenses, basis)
        .filter(|expense| expense.category == category)
        .map(|expense| expense.amount)
        .sum()
}

/// `allocated - spent`. Negative means over budget.
#[must_use]
pub fn remaining(allocated: Decimal, spent: Decimal) -> Decimal {
    allocated - spent
}

/// `spent / allocated * 100`, or zero when nothing is allocated.
///
/// A ratio too large for [`Decimal`] saturates at [`Decimal::MAX`].
#[must_use]
pub fn utilization_percent(spent: Decimal, allocated: Decimal) -> Decimal {
    if allocated.is_zero() {
        return Decimal::ZERO;
    }
    spent
        .checked_div(allocated)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}

fn counted(expenses: &[Expense], basis: SpendBasis) -> impl Iterator<Item = &Expense> {
    expenses
        .iter()
        .filter(move |expense| basis.counts(expense.status))
}

/// Allocated versus spent for one budget category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryVariance {
    /// Allocation category.
    pub category: String,
    /// Allocation fiscal year.
    pub fiscal_year: i32,
    /// Amount set aside.
    pub allocated: Decimal,
    /// Counted spend in the category.
    pub spent: Decimal,
    /// `allocated - spent`.
    pub variance: Decimal,
    /// Share of the allocation spent.
    pub utilization: Decimal,
    /// Risk tier derived from utilization.
    pub risk: RiskTier,
}

impl CategoryVariance {
    fn compute(budget: &BudgetAllocation, expenses: &[Expense], basis: SpendBasis) -> Self {
        let spent = spent_in_category(expenses, &budget.category, basis);
        let utilization = utilization_percent(spent, budget.allocated_amount);
        Self {
            category: budget.category.clone(),
            fiscal_year: budget.fiscal_year,
            allocated: budget.allocated_amount,
            spent,
            variance: remaining(budget.allocated_amount, spent),
            utilization,
            risk: RiskTier::classify(utilization),
        }
    }
}

/// One variance per allocation, in allocation order.
#[must_use]
pub fn category_variances(
    budgets: &[BudgetAllocation],
    expenses: &[Expense],
    basis: SpendBasis,
) -> Vec<CategoryVariance> {
    budgets
        .iter()
        .map(|budget| CategoryVariance::compute(budget, expenses, basis))
        .collect()
}

/// Count of categories per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceSummary {
    /// Categories in [`RiskTier::Low`].
    pub low: usize,
    /// Categories in [`RiskTier::Medium`].
    pub medium: usize,
    /// Categories in [`RiskTier::High`].
    pub high: usize,
}

impl ComplianceSummary {
    /// Tally the tiers of `variances`.
    #[must_use]
    pub fn from_variances(variances: &[CategoryVariance]) -> Self {
        variances
            .iter()
            .fold(Self::default(), |mut summary, variance| {
                let slot = match variance.risk {
                    RiskTier::Low => &mut summary.low,
                    RiskTier::Medium => &mut summary.medium,
                    RiskTier::High => &mut summary.high,
                };
                *slot = slot.saturating_add(1);
                summary
            })
    }

    /// Number of categories classified.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.low
            .saturating_add(self.medium)
            .saturating_add(self.high)
    }
}

/// Headline totals shown on every financial dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    /// Which expenses were counted.
    pub basis: SpendBasis,
    /// Sum of every allocation.
    pub total_allocated: Decimal,
    /// Sum of counted expenses.
    pub total_spent: Decimal,
    /// `total_allocated - total_spent`; negative when over budget.
    pub remaining: Decimal,
    /// Spent as a percentage of allocated.
    pub utilization: Decimal,
}

impl BudgetSummary {
    /// Reduce both collections to the headline totals.
    ///
    /// # Examples
    /// ```
    /// use sbo_dashboard::domain::finance::{BudgetSummary, SpendBasis};
    ///
    /// let summary = BudgetSummary::compute(&[], &[], SpendBasis::default());
    /// assert!(summary.utilization.is_zero());
    /// assert!(!summary.is_over_budget());
    /// ```
    #[must_use]
    pub fn compute(budgets: &[BudgetAllocation], expenses: &[Expense], basis: SpendBasis) -> Self {
        let total_allocated = total_allocated(budgets);
        let total_spent = total_spent(expenses, basis);
        Self {
            basis,
            total_allocated,
            total_spent,
            remaining: remaining(total_allocated, total_spent),
            utilization: utilization_percent(total_spent, total_allocated),
        }
    }

    /// Whether spend exceeds the allocation.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.remaining.is_sign_negative() && !self.remaining.is_zero()
    }
}

/// Spend in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlySpend {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1 to 12.
    pub month: u32,
    /// Counted spend in the month.
    pub total: Decimal,
}

/// Spend per calendar month in chronological order. Months without any
/// counted expense are omitted.
#[must_use]
pub fn monthly_spend(expenses: &[Expense], basis: SpendBasis) -> Vec<MonthlySpend> {
    let mut months: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for expense in counted(expenses, basis) {
        let key = (expense.expense_date.year(), expense.expense_date.month());
        *months.entry(key).or_default() += expense.amount;
    }
    months
        .into_iter()
        .map(|((year, month), total)| MonthlySpend { year, month, total })
        .collect()
}

#[cfg(test)]
#[path = "finance_tests.rs"]
mod tests;
