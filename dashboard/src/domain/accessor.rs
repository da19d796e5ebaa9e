//! Generic fetch, mutate and mirror wrapper around one backend table.
//!
//! A [`ResourceAccessor`] is instantiated once per entity. It owns the local
//! mirror of the collection and applies every mutation to it only after the
//! backend confirms. Each mutation follows the same sequence:
//!
//! 1. role check against the entity's allow-set (no network on denial);
//! 2. client-side validation of the payload;
//! 3. the backend call;
//! 4. the mirror update, a success notice and, for audited entities, an
//!    audit event handed to the side-channel.
//!
//! Any failure before step 4 leaves the mirror untouched.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::domain::audit_dispatch::AuditDispatcher;
use crate::domain::ports::{
    AuditAction, AuditEvent, Notice, Notifier, SelectQuery, TableGateway, TableGatewayError,
};
use crate::domain::resource::{Draft, Patch, Placement, Resource, sentence_case};
use crate::domain::{DomainError, RoleSet, Session, UserId};

/// Load state of the mirrored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing fetched yet for the current session.
    Loading,
    /// The mirror reflects the last successful fetch plus local mutations.
    Loaded,
    /// The last fetch failed; the mirror holds whatever it held before.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    const fn verb(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Create => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn past_tense(self) -> &'static str {
        match self {
            Self::Fetch => "fetched",
            Self::Create => "added",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }

    const fn permission_verb(self) -> &'static str {
        match self {
            Self::Fetch => "view",
            other => other.verb(),
        }
    }
}

/// Message shown when a role check rejects an operation.
pub(crate) fn denial_message(allowed: RoleSet, verb: &str, plural: &str) -> String {
    if allowed.is_empty() {
        format!("{} are read-only", sentence_case(plural))
    } else {
        format!("Only the {allowed} can {verb} {plural}")
    }
}

/// Map a gateway failure onto the domain error taxonomy.
pub(crate) fn map_gateway_error(error: TableGatewayError) -> DomainError {
    match error {
        TableGatewayError::Transport { message } => {
            DomainError::service_unavailable(format!("backend unavailable: {message}"))
        }
        TableGatewayError::Rejected { status, message } => {
            DomainError::internal(format!("backend rejected the request: {message}"))
                .with_details(json!({ "status": status }))
        }
        TableGatewayError::Decode { message } => {
            DomainError::internal(format!("backend response could not be read: {message}"))
        }
    }
}

fn decode_row<R: Resource>(row: Value) -> Result<R, DomainError> {
    serde_json::from_value(row).map_err(|err| {
        DomainError::internal(format!("{} row could not be decoded: {err}", R::TABLE))
    })
}

fn encode_payload<T: Serialize>(noun: &str, payload: &T) -> Result<Value, DomainError> {
    serde_json::to_value(payload)
        .map_err(|err| DomainError::internal(format!("failed to serialise {noun}: {err}")))
}

fn stamp_owner(row: &mut Value, user_id: UserId) {
    if let Value::Object(fields) = row {
        let owner = Value::String(user_id.to_string());
        fields.insert("user_id".to_owned(), owner.clone());
        fields.insert("created_by".to_owned(), owner);
    }
}

fn snapshot<R: Resource>(record: &R) -> Option<Value> {
    serde_json::to_value(record).ok()
}

/// Fetch+mutate+mirror wrapper for the resource `R`.
pub struct ResourceAccessor<R> {
    session: Session,
    tables: Arc<dyn TableGateway>,
    notifier: Arc<dyn Notifier>,
    audit: Option<AuditDispatcher>,
    items: Vec<R>,
    state: LoadState,
}

impl<R: Resource> ResourceAccessor<R> {
    /// Create an accessor bound to `session`. Nothing is fetched until
    /// [`Self::fetch_all`] runs.
    #[must_use]
    pub const fn new(
        session: Session,
        tables: Arc<dyn TableGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            tables,
            notifier,
            audit: None,
            items: Vec::new(),
            state: LoadState::Loading,
        }
    }

    /// Attach the audit side-channel. Only consulted when `R` is audited.
    #[must_use]
    pub fn with_audit(mut self, dispatcher: AuditDispatcher) -> Self {
        self.audit = Some(dispatcher);
        self
    }

    /// Session the accessor acts for.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Current mirror of the collection.
    #[must_use]
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Current load state.
    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// Whether the first fetch for this session is still outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// Look up a mirrored record by id.
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether the session may read the table.
    #[must_use]
    pub fn can_read(&self) -> bool {
        R::READ.is_none_or(|allowed| self.session.has_any(allowed))
    }

    /// Whether the session may create records.
    #[must_use]
    pub fn can_create(&self) -> bool {
        self.session.has_any(R::WRITE.create)
    }

    /// Whether the session may update records with the default policy.
    ///
    /// Individual patches may demand more; see [`Resource::update_roles`].
    #[must_use]
    pub fn can_update(&self) -> bool {
        self.session.has_any(R::WRITE.update)
    }

    /// Whether the session may delete records.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.session.has_any(R::WRITE.delete)
    }

    /// Whether any mutation is open to the session.
    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.can_create() || self.can_update() || self.can_delete()
    }

    /// Rebind the accessor to `session`.
    ///
    /// A session outside the read allow-set never sees mirrored rows: the
    /// mirror is emptied and marked loaded. A different user, or a role that
    /// newly gains read access, empties the mirror and puts the accessor back
    /// in [`LoadState::Loading`]. Returns `true` when a fetch is needed.
    pub fn set_session(&mut self, session: Session) -> bool {
        let could_read = self.can_read();
        let identity_changed = self.session.is_other_identity(&session);
        self.session = session;
        if !self.can_read() {
            self.items.clear();
            self.state = LoadState::Loaded;
        } else if identity_changed || !could_read {
            self.items.clear();
            self.state = LoadState::Loading;
        }
        self.loading()
    }

    /// Replace the mirror with the full collection in its fixed order.
    ///
    /// Sessions outside the read allow-set get an empty collection without a
    /// network call. On failure the previous mirror is kept and an error
    /// notice is raised.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend failure.
    pub async fn fetch_all(&mut self) -> Result<(), DomainError> {
        if !self.can_read() {
            self.items.clear();
            self.state = LoadState::Loaded;
            return Ok(());
        }

        let mut query = SelectQuery::ordered(R::ORDER);
        if let Some(limit) = R::FETCH_LIMIT {
            query = query.limit(limit);
        }

        match self.query(&query).await {
            Ok(items) => {
                self.items = items;
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(error) => {
                self.state = LoadState::Failed;
                Err(self.report_failure(Operation::Fetch, error))
            }
        }
    }

    /// Alias for [`Self::fetch_all`] used after out-of-band changes.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend failure.
    pub async fn refetch(&mut self) -> Result<(), DomainError> {
        self.fetch_all().await
    }

    /// Create a record and place it in the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] when the session may
    /// not create, [`crate::domain::ErrorCode::InvalidRequest`] when the
    /// draft is rejected, or the mapped backend failure.
    pub async fn create(&mut self, draft: &R::Draft) -> Result<R, DomainError> {
        self.authorize(R::WRITE.create, Operation::Create)?;
        self.check(draft.validate(&self.items))?;

        let outcome = self.insert_row(draft).await;
        let (record, stored) = outcome.map_err(|err| self.report_failure(Operation::Create, err))?;

        self.place(record.clone());
        self.announce_success(Operation::Create);
        self.audit(AuditAction::Insert, record.id(), None, Some(stored));
        Ok(record)
    }

    /// Apply `patch` to the record keyed by `id` and replace it in the
    /// mirror.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] when the session may
    /// not apply this patch, [`crate::domain::ErrorCode::InvalidRequest`]
    /// when the patch is rejected, or the mapped backend failure.
    pub async fn update(&mut self, id: Uuid, patch: &R::Patch) -> Result<R, DomainError> {
        self.authorize(R::update_roles(patch), Operation::Update)?;
        self.check(patch.validate(id, &self.items))?;

        let outcome = self.update_row(id, patch).await;
        let (record, stored) = outcome.map_err(|err| self.report_failure(Operation::Update, err))?;

        let previous = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .map(|slot| std::mem::replace(slot, record.clone()));
        self.announce_success(Operation::Update);
        self.audit(
            AuditAction::Update,
            id,
            previous.as_ref().and_then(snapshot),
            Some(stored),
        );
        Ok(record)
    }

    /// Permanently delete the record keyed by `id` and drop it from the
    /// mirror.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] when the session may
    /// not delete, or the mapped backend failure.
    pub async fn delete(&mut self, id: Uuid) -> Result<(), DomainError> {
        self.authorize(R::WRITE.delete, Operation::Delete)?;

        self.tables
            .delete(R::TABLE, id)
            .await
            .map_err(map_gateway_error)
            .map_err(|err| self.report_failure(Operation::Delete, err))?;

        let removed = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .map(|index| self.items.remove(index));
        self.announce_success(Operation::Delete);
        self.audit(
            AuditAction::Delete,
            id,
            removed.as_ref().and_then(snapshot),
            None,
        );
        Ok(())
    }

    /// Run an ad hoc select against the table without touching the mirror.
    pub(crate) async fn query(&self, query: &SelectQuery) -> Result<Vec<R>, DomainError> {
        let rows = self
            .tables
            .select(R::TABLE, query)
            .await
            .map_err(map_gateway_error)?;
        rows.into_iter().map(decode_row::<R>).collect()
    }

    /// Reject the operation unless the session holds one of `allowed`.
    pub(crate) fn authorize(&self, allowed: RoleSet, operation: Operation) -> Result<(), DomainError> {
        if self.session.has_any(allowed) {
            return Ok(());
        }
        self.deny(allowed, operation.permission_verb(), R::PLURAL)
    }

    /// Raise a permission notice and return the matching error.
    pub(crate) fn deny(&self, allowed: RoleSet, verb: &str, plural: &str) -> Result<(), DomainError> {
        let message = denial_message(allowed, verb, plural);
        self.notifier.notify(Notice::error(message.as_str()));
        Err(DomainError::forbidden(message))
    }

    /// Log a backend failure, raise the matching notice and hand the error
    /// back.
    pub(crate) fn report_failure(&self, operation: Operation, error: DomainError) -> DomainError {
        error!(
            table = %R::TABLE,
            operation = operation.verb(),
            error = %error,
            "backend call failed"
        );
        let subject = match operation {
            Operation::Fetch => R::PLURAL,
            _ => R::NOUN,
        };
        self.notifier
            .notify(Notice::error(format!("Failed to {} {subject}", operation.verb())));
        error
    }

    fn check(&self, outcome: Result<(), DomainError>) -> Result<(), DomainError> {
        outcome.inspect_err(|error| self.notifier.notify(Notice::error(error.message())))
    }

    async fn insert_row(&self, draft: &R::Draft) -> Result<(R, Value), DomainError> {
        let mut row = encode_payload(R::NOUN, draft)?;
        if R::OWNED {
            stamp_owner(&mut row, self.session.user_id());
        }
        let stored = self
            .tables
            .insert(R::TABLE, &row)
            .await
            .map_err(map_gateway_error)?;
        let record = decode_row::<R>(stored.clone())?;
        Ok((record, stored))
    }

    async fn update_row(&self, id: Uuid, patch: &R::Patch) -> Result<(R, Value), DomainError> {
        let changes = encode_payload(R::NOUN, patch)?;
        let stored = self
            .tables
            .update(R::TABLE, id, &changes)
            .await
            .map_err(map_gateway_error)?;
        let record = decode_row::<R>(stored.clone())?;
        Ok((record, stored))
    }

    fn place(&mut self, record: R) {
        match R::PLACEMENT {
            Placement::Prepend => self.items.insert(0, record),
            Placement::Append => self.items.push(record),
            Placement::Sorted => {
                self.items.push(record);
                self.items.sort_by(R::placement_cmp);
            }
        }
    }

    fn announce_success(&self, operation: Operation) {
        self.notifier.notify(Notice::success(format!(
            "{} {} successfully",
            sentence_case(R::NOUN),
            operation.past_tense()
        )));
    }

    fn audit(
        &self,
        action: AuditAction,
        record_id: Uuid,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) {
        if !R::AUDITED {
            return;
        }
        if let Some(dispatcher) = &self.audit {
            dispatcher.dispatch(AuditEvent {
                action,
                table: R::TABLE,
                record_id,
                old_values,
                new_values,
            });
        }
    }
}

#[cfg(test)]
#[path = "accessor_tests.rs"]
mod tests;
