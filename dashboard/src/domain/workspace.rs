//! The seven resource accessors bound to one session.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::accessor::ResourceAccessor;
use crate::domain::audit_dispatch::AuditDispatcher;
use crate::domain::dashboards::{
    AuditorOverview, Dashboard, DashboardKind, PresidentOverview, SecretaryOverview,
};
use crate::domain::entities::{
    Announcement, AuditLogEntry, BudgetAllocation, Document, Event, Expense, Officer,
};
use crate::domain::finance::{BudgetSummary, SpendBasis};
use crate::domain::ports::{Notifier, ObjectStore, Table, TableGateway};
use crate::domain::resource::Resource;
use crate::domain::uploads::Uploads;
use crate::domain::{DomainError, Session};

/// One collection that failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    /// Table whose fetch failed.
    pub table: Table,
    /// Mapped backend failure.
    pub error: DomainError,
}

/// Outcome of [`Workspace::switch_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSwitch {
    /// Same user and nothing newly readable; mirrors kept as they were.
    Unchanged,
    /// Collections were fetched: all of them for a new user, or the ones
    /// the new role newly reads for the same user.
    Refetched(Vec<LoadFailure>),
}

async fn fetch_one<R: Resource>(
    accessor: &mut ResourceAccessor<R>,
    pending_only: bool,
) -> Result<(), DomainError> {
    if pending_only && !accessor.loading() {
        return Ok(());
    }
    accessor.fetch_all().await
}

fn failure<R: Resource>(outcome: Result<(), DomainError>) -> Option<LoadFailure> {
    outcome.err().map(|error| LoadFailure {
        table: R::TABLE,
        error,
    })
}

/// Every accessor the dashboards read from, bound to the same session.
pub struct Workspace {
    session: Session,
    notifier: Arc<dyn Notifier>,
    basis: SpendBasis,
    /// Budget allocations.
    pub budgets: ResourceAccessor<BudgetAllocation>,
    /// Expenses.
    pub expenses: ResourceAccessor<Expense>,
    /// Events.
    pub events: ResourceAccessor<Event>,
    /// Announcements.
    pub announcements: ResourceAccessor<Announcement>,
    /// Officer directory.
    pub officers: ResourceAccessor<Officer>,
    /// Documents.
    pub documents: ResourceAccessor<Document>,
    /// Most recent audit trail entries.
    pub audit_log: ResourceAccessor<AuditLogEntry>,
}

impl Workspace {
    /// Build unfetched accessors for `session`.
    #[must_use]
    pub fn new(
        session: Session,
        tables: &Arc<dyn TableGateway>,
        notifier: &Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            notifier: Arc::clone(notifier),
            basis: SpendBasis::default(),
            budgets: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
            expenses: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
            events: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
            announcements: ResourceAccessor::new(
                session,
                Arc::clone(tables),
                Arc::clone(notifier),
            ),
            officers: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
            documents: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
            audit_log: ResourceAccessor::new(session, Arc::clone(tables), Arc::clone(notifier)),
        }
    }

    /// Route audited mutations to `dispatcher`.
    #[must_use]
    pub fn with_audit(mut self, dispatcher: &AuditDispatcher) -> Self {
        self.expenses = self.expenses.with_audit(dispatcher.clone());
        self.events = self.events.with_audit(dispatcher.clone());
        self.documents = self.documents.with_audit(dispatcher.clone());
        self
    }

    /// Select which expenses count toward spend.
    #[must_use]
    pub const fn with_spend_basis(mut self, basis: SpendBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Session every accessor is bound to.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Which expenses count toward spend.
    #[must_use]
    pub const fn spend_basis(&self) -> SpendBasis {
        self.basis
    }

    /// Whether any collection is still waiting for its first fetch.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.budgets.loading()
            || self.expenses.loading()
            || self.events.loading()
            || self.announcements.loading()
            || self.officers.loading()
            || self.documents.loading()
            || self.audit_log.loading()
    }

    /// Fetch every collection concurrently.
    ///
    /// Each accessor reports its own failure; the returned list names the
    /// collections that did not load.
    pub async fn fetch_all(&mut self) -> Vec<LoadFailure> {
        self.fetch(false).await
    }

    /// Fetch only the collections still waiting for their first fetch.
    pub async fn fetch_pending(&mut self) -> Vec<LoadFailure> {
        self.fetch(true).await
    }

    async fn fetch(&mut self, pending_only: bool) -> Vec<LoadFailure> {
        let (budgets, expenses, events, announcements, officers, documents, audit_log) = tokio::join!(
            fetch_one(&mut self.budgets, pending_only),
            fetch_one(&mut self.expenses, pending_only),
            fetch_one(&mut self.events, pending_only),
            fetch_one(&mut self.announcements, pending_only),
            fetch_one(&mut self.officers, pending_only),
            fetch_one(&mut self.documents, pending_only),
            fetch_one(&mut self.audit_log, pending_only),
        );
        [
            failure::<BudgetAllocation>(budgets),
            failure::<Expense>(expenses),
            failure::<Event>(events),
            failure::<Announcement>(announcements),
            failure::<Officer>(officers),
            failure::<Document>(documents),
            failure::<AuditLogEntry>(audit_log),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Rebind every accessor to `session`.
    ///
    /// A different user resets and refetches every collection. The same
    /// user keeps the mirrors it may still read; collections the new role
    /// can no longer read are emptied and those it newly gains are fetched.
    pub async fn switch_session(&mut self, session: Session) -> SessionSwitch {
        let identity_changed = self.session.is_other_identity(&session);
        self.session = session;
        let needs_fetch = [
            self.budgets.set_session(session),
            self.expenses.set_session(session),
            self.events.set_session(session),
            self.announcements.set_session(session),
            self.officers.set_session(session),
            self.documents.set_session(session),
            self.audit_log.set_session(session),
        ];
        if identity_changed {
            return SessionSwitch::Refetched(self.fetch_all().await);
        }
        if needs_fetch.contains(&true) {
            return SessionSwitch::Refetched(self.fetch_pending().await);
        }
        SessionSwitch::Unchanged
    }

    /// Upload flows for the current session.
    #[must_use]
    pub fn uploads(&self, store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Uploads {
        Uploads::new(self.session, store, Arc::clone(&self.notifier), clock)
    }

    /// Headline totals over the mirrored budgets and expenses.
    #[must_use]
    pub fn budget_summary(&self) -> BudgetSummary {
        BudgetSummary::compute(self.budgets.items(), self.expenses.items(), self.basis)
    }

    /// Overview for the session's role.
    #[must_use]
    pub fn dashboard(&self) -> Option<Dashboard> {
        let kind = DashboardKind::for_session(&self.session)?;
        Some(match kind {
            DashboardKind::President => Dashboard::President(PresidentOverview::compose(
                self.budgets.items(),
                self.expenses.items(),
                self.events.items(),
                self.announcements.items(),
                self.officers.items(),
                self.basis,
            )),
            DashboardKind::Auditor => Dashboard::Auditor(AuditorOverview::compose(
                self.budgets.items(),
                self.expenses.items(),
                self.audit_log.items(),
                self.basis,
            )),
            DashboardKind::Secretary => Dashboard::Secretary(SecretaryOverview::compose(
                self.events.items(),
                self.announcements.items(),
                self.documents.items(),
                self.expenses.items(),
            )),
        })
    }
}
