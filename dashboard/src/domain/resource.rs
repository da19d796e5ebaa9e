//! Static description of a backend-mirrored entity.
//!
//! [`Resource`] carries everything the generic accessor needs to know about
//! one table: where it lives, how it is ordered, where new rows land in the
//! local mirror, who may write it and whether writes are audited.

use std::cmp::Ordering;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::ports::{OrderBy, Table};
use crate::domain::{DomainError, RoleSet};

/// Where a freshly created row is placed in the local mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Insert at the head of the collection.
    Prepend,
    /// Insert at the tail of the collection.
    Append,
    /// Insert, then stable-sort with [`Resource::placement_cmp`].
    Sorted,
}

/// Roles admitted per mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    /// Roles that may create rows.
    pub create: RoleSet,
    /// Roles that may update rows.
    pub update: RoleSet,
    /// Roles that may delete rows.
    pub delete: RoleSet,
}

impl WritePolicy {
    /// Same allow-set for every mutation.
    #[must_use]
    pub const fn uniform(roles: RoleSet) -> Self {
        Self {
            create: roles,
            update: roles,
            delete: roles,
        }
    }

    /// Policy for append-only tables written by the backend itself.
    pub const READ_ONLY: Self = Self::uniform(RoleSet::NONE);
}

/// Creation payload for a resource.
pub trait Draft<R>: Serialize + Send + Sync {
    /// Client-side validation run after the role check and before any
    /// network call. `existing` is the current local mirror.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::domain::ErrorCode::InvalidRequest`] error naming
    /// the offending field.
    fn validate(&self, existing: &[R]) -> Result<(), DomainError>;
}

/// Partial update payload for a resource.
pub trait Patch<R>: Serialize + Send + Sync {
    /// Client-side validation run after the role check and before any
    /// network call. `id` keys the record being patched and `existing` is
    /// the current local mirror.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::domain::ErrorCode::InvalidRequest`] error naming
    /// the offending field.
    fn validate(&self, id: Uuid, existing: &[R]) -> Result<(), DomainError>;
}

/// Payload type for tables the dashboard never writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadOnly {}

impl<R> Draft<R> for ReadOnly {
    fn validate(&self, _existing: &[R]) -> Result<(), DomainError> {
        match *self {}
    }
}

impl<R> Patch<R> for ReadOnly {
    fn validate(&self, _id: Uuid, _existing: &[R]) -> Result<(), DomainError> {
        match *self {}
    }
}

/// A row type mirrored from one backend table.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Creation payload.
    type Draft: Draft<Self>;
    /// Partial update payload.
    type Patch: Patch<Self>;

    /// Backing table.
    const TABLE: Table;
    /// Singular noun used in notifications.
    const NOUN: &'static str;
    /// Plural noun used in notifications.
    const PLURAL: &'static str;
    /// Fixed fetch ordering.
    const ORDER: OrderBy;
    /// Where created rows land in the mirror.
    const PLACEMENT: Placement;
    /// Roles admitted per mutation.
    const WRITE: WritePolicy;
    /// Roles admitted to read the table; `None` admits any signed-in user.
    const READ: Option<RoleSet> = None;
    /// Row cap applied to `fetch_all`.
    const FETCH_LIMIT: Option<usize> = None;
    /// Whether successful mutations are reported to the audit trail.
    const AUDITED: bool = false;
    /// Whether inserted rows carry `created_by`/`user_id` of the session.
    const OWNED: bool = true;

    /// Primary key.
    fn id(&self) -> Uuid;

    /// Roles admitted for a specific patch. Defaults to the update policy.
    fn update_roles(_patch: &Self::Patch) -> RoleSet {
        Self::WRITE.update
    }

    /// Ordering used by [`Placement::Sorted`].
    fn placement_cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

/// Upper-case the first character of `noun` for sentence starts.
pub(crate) fn sentence_case(noun: &str) -> String {
    let mut chars = noun.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("expense", "Expense")]
    #[case("budget allocation", "Budget allocation")]
    #[case("", "")]
    fn sentence_case_capitalises_first_letter(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sentence_case(raw), expected);
    }
}
