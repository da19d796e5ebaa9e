//! Per-role overviews.
//!
//! Overviews are pure compositions of mirrored collections and the
//! financial aggregator. They hold no state of their own and are rebuilt
//! whenever the underlying collections change.

use serde::Serialize;

use crate::domain::entities::{
    Announcement, AuditLogEntry, BudgetAllocation, Document, Event, Expense, Officer,
};
use crate::domain::finance::{
    BudgetSummary, CategoryVariance, ComplianceSummary, MonthlySpend, RiskTier, SpendBasis,
    category_variances, monthly_spend,
};
use crate::domain::{Role, Session};

const PRESIDENT_RECENT_EXPENSES: usize = 5;
const PRESIDENT_UPCOMING_EVENTS: usize = 5;
const PRESIDENT_ANNOUNCEMENTS: usize = 3;
const AUDITOR_RECENT_EXPENSES: usize = 5;
const AUDITOR_RECENT_ACTIVITY: usize = 5;
const SECRETARY_RECENT_ITEMS: usize = 3;

fn head<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    items.iter().take(count).cloned().collect()
}

/// Which overview a session lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    /// Financial and organisation overview.
    President,
    /// Variance, risk and activity overview.
    Auditor,
    /// Records-keeping overview.
    Secretary,
}

impl DashboardKind {
    /// Overview for the session's role; `None` without a role.
    #[must_use]
    pub const fn for_session(session: &Session) -> Option<Self> {
        match session.role() {
            Some(Role::President) => Some(Self::President),
            Some(Role::Auditor) => Some(Self::Auditor),
            Some(Role::Secretary) => Some(Self::Secretary),
            None => None,
        }
    }
}

/// Organisation-wide overview for the President.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresidentOverview {
    /// Headline totals.
    pub summary: BudgetSummary,
    /// Allocated versus spent per category.
    pub categories: Vec<CategoryVariance>,
    /// Officers in the directory.
    pub officer_count: usize,
    /// Scheduled events.
    pub event_count: usize,
    /// Posted announcements.
    pub announcement_count: usize,
    /// Newest expenses.
    pub recent_expenses: Vec<Expense>,
    /// Soonest events.
    pub upcoming_events: Vec<Event>,
    /// Newest announcements.
    pub latest_announcements: Vec<Announcement>,
}

impl PresidentOverview {
    /// Build the overview from the mirrored collections.
    #[must_use]
    pub fn compose(
        budgets: &[BudgetAllocation],
        expenses: &[Expense],
        events: &[Event],
        announcements: &[Announcement],
        officers: &[Officer],
        basis: SpendBasis,
    ) -> Self {
        Self {
            summary: BudgetSummary::compute(budgets, expenses, basis),
            categories: category_variances(budgets, expenses, basis),
            officer_count: officers.len(),
            event_count: events.len(),
            announcement_count: announcements.len(),
            recent_expenses: head(expenses, PRESIDENT_RECENT_EXPENSES),
            upcoming_events: head(events, PRESIDENT_UPCOMING_EVENTS),
            latest_announcements: head(announcements, PRESIDENT_ANNOUNCEMENTS),
        }
    }
}

/// Variance, risk and activity overview for the Auditor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditorOverview {
    /// Headline totals.
    pub summary: BudgetSummary,
    /// Allocated versus spent per category.
    pub categories: Vec<CategoryVariance>,
    /// Categories per risk tier.
    pub compliance: ComplianceSummary,
    /// Spend per month, oldest first.
    pub trend: Vec<MonthlySpend>,
    /// Newest expenses.
    pub recent_expenses: Vec<Expense>,
    /// Newest audit trail entries.
    pub recent_activity: Vec<AuditLogEntry>,
}

impl AuditorOverview {
    /// Build the overview from the mirrored collections.
    #[must_use]
    pub fn compose(
        budgets: &[BudgetAllocation],
        expenses: &[Expense],
        audit_log: &[AuditLogEntry],
        basis: SpendBasis,
    ) -> Self {
        let categories = category_variances(budgets, expenses, basis);
        let compliance = ComplianceSummary::from_variances(&categories);
        Self {
            summary: BudgetSummary::compute(budgets, expenses, basis),
            categories,
            compliance,
            trend: monthly_spend(expenses, basis),
            recent_expenses: head(expenses, AUDITOR_RECENT_EXPENSES),
            recent_activity: head(audit_log, AUDITOR_RECENT_ACTIVITY),
        }
    }

    /// Number of categories above the high-risk threshold.
    #[must_use]
    pub const fn high_risk_count(&self) -> usize {
        self.compliance.high
    }

    /// Categories in `tier`, in allocation order.
    pub fn categories_at(&self, tier: RiskTier) -> impl Iterator<Item = &CategoryVariance> {
        self.categories
            .iter()
            .filter(move |variance| variance.risk == tier)
    }
}

/// Records-keeping overview for the Secretary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretaryOverview {
    /// Scheduled events.
    pub event_count: usize,
    /// Events visible to non-members.
    pub public_event_count: usize,
    /// Posted announcements.
    pub announcement_count: usize,
    /// Announcements visible to non-members.
    pub public_announcement_count: usize,
    /// Stored documents.
    pub document_count: usize,
    /// Recorded expenses.
    pub expense_count: usize,
    /// First events in date order.
    pub recent_events: Vec<Event>,
    /// Newest announcements.
    pub recent_announcements: Vec<Announcement>,
    /// Newest documents.
    pub recent_documents: Vec<Document>,
    /// Newest expenses.
    pub recent_expenses: Vec<Expense>,
}

impl SecretaryOverview {
    /// Build the overview from the mirrored collections.
    #[must_use]
    pub fn compose(
        events: &[Event],
        announcements: &[Announcement],
        documents: &[Document],
        expenses: &[Expense],
    ) -> Self {
        Self {
            event_count: events.len(),
            public_event_count: events.iter().filter(|event| event.is_public).count(),
            announcement_count: announcements.len(),
            public_announcement_count: announcements
                .iter()
                .filter(|announcement| announcement.is_public)
                .count(),
            document_count: documents.len(),
            expense_count: expenses.len(),
            recent_events: head(events, SECRETARY_RECENT_ITEMS),
            recent_announcements: head(announcements, SECRETARY_RECENT_ITEMS),
            recent_documents: head(documents, SECRETARY_RECENT_ITEMS),
            recent_expenses: head(expenses, SECRETARY_RECENT_ITEMS),
        }
    }
}

/// The overview a session sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dashboard {
    /// President overview.
    President(PresidentOverview),
    /// Auditor overview.
    Auditor(AuditorOverview),
    /// Secretary overview.
    Secretary(SecretaryOverview),
}

impl Dashboard {
    /// Which overview this is.
    #[must_use]
    pub const fn kind(&self) -> DashboardKind {
        match self {
            Self::President(_) => DashboardKind::President,
            Self::Auditor(_) => DashboardKind::Auditor,
            Self::Secretary(_) => DashboardKind::Secretary,
        }
    }
}
