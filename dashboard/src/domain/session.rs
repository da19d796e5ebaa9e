//! Signed-in session and the role authority.
//!
//! A [`Session`] is passed explicitly to every accessor rather than read from
//! ambient state. It carries the signed-in user and at most one role; the
//! role checks are pure reads and fail closed when no role is assigned.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::RoleDirectory;
use crate::domain::{Role, RoleSet};

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    Empty,
    /// The identifier was not a bare UUID.
    #[error("user id must be a valid UUID")]
    Invalid,
}

/// Stable user identifier issued by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is blank, padded or not a UUID.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(UserIdValidationError::Invalid);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserIdValidationError::Invalid)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The signed-in actor.
///
/// # Examples
/// ```
/// use sbo_dashboard::domain::{Role, Session, UserId};
///
/// let session = Session::new(UserId::random(), Some(Role::Auditor));
/// assert!(session.has_role(Role::Auditor));
/// assert!(!session.has_role(Role::President));
///
/// let unassigned = Session::new(UserId::random(), None);
/// assert!(!unassigned.has_role(Role::Auditor));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    role: Option<Role>,
}

impl Session {
    /// Build a session for `user_id` with an optional resolved role.
    #[must_use]
    pub const fn new(user_id: UserId, role: Option<Role>) -> Self {
        Self { user_id, role }
    }

    /// Identity of the signed-in user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Assigned role, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.role
    }

    /// Compare the assigned role against `candidate`.
    ///
    /// Always `false` when no role is assigned.
    #[must_use]
    pub fn has_role(&self, candidate: Role) -> bool {
        self.role == Some(candidate)
    }

    /// Whether the assigned role belongs to `allowed`.
    #[must_use]
    pub fn has_any(&self, allowed: RoleSet) -> bool {
        self.role.is_some_and(|role| allowed.contains(role))
    }

    /// Whether `other` belongs to a different user.
    #[must_use]
    pub fn is_other_identity(&self, other: &Self) -> bool {
        self.user_id != other.user_id
    }
}

/// Resolve the role for a freshly signed-in user.
///
/// Lookup failures are logged and yield a session without a role, so every
/// gated operation is denied until the role can be read.
pub async fn resolve_session(directory: &dyn RoleDirectory, user_id: UserId) -> Session {
    match directory.role_for(&user_id).await {
        Ok(role) => Session::new(user_id, role),
        Err(error) => {
            warn!(user_id = %user_id, error = %error, "role lookup failed; continuing without a role");
            Session::new(user_id, None)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockRoleDirectory, RoleDirectoryError};
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("not-a-uuid")]
    fn user_id_rejects_invalid_input(#[case] raw: &str) {
        assert!(UserId::new(raw).is_err());
    }

    #[rstest]
    fn unassigned_role_fails_closed() {
        let session = Session::new(UserId::random(), None);
        for role in Role::ALL {
            assert!(!session.has_role(role));
        }
        assert!(!session.has_any(RoleSet::only(Role::President).with(Role::Secretary)));
    }

    #[rstest]
    #[case(Role::President)]
    #[case(Role::Auditor)]
    #[case(Role::Secretary)]
    fn assigned_role_matches_exactly_one_candidate(#[case] assigned: Role) {
        let session = Session::new(UserId::random(), Some(assigned));
        let matches = Role::ALL
            .into_iter()
            .filter(|candidate| session.has_role(*candidate))
            .count();
        assert_eq!(matches, 1);
        assert!(session.has_role(assigned));
    }

    #[rstest]
    fn identity_change_ignores_role() {
        let user_id = UserId::random();
        let first = Session::new(user_id, Some(Role::Secretary));
        let same_user = Session::new(user_id, Some(Role::President));
        let other_user = Session::new(UserId::random(), Some(Role::Secretary));

        assert!(!first.is_other_identity(&same_user));
        assert!(first.is_other_identity(&other_user));
    }

    #[tokio::test]
    async fn resolve_session_uses_directory_role() {
        let mut directory = MockRoleDirectory::new();
        directory
            .expect_role_for()
            .times(1)
            .return_once(|_| Ok(Some(Role::Auditor)));

        let session = resolve_session(&directory, UserId::random()).await;
        assert_eq!(session.role(), Some(Role::Auditor));
    }

    #[tokio::test]
    async fn resolve_session_fails_closed_on_lookup_error() {
        let mut directory = MockRoleDirectory::new();
        directory
            .expect_role_for()
            .times(1)
            .return_once(|_| Err(RoleDirectoryError::transport("connection refused")));

        let session = resolve_session(&directory, UserId::random()).await;
        assert_eq!(session.role(), None);
    }
}
