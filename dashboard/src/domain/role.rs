//! Officer roles and explicit allow-sets.
//!
//! There is no hierarchy between roles. Every gated operation names the exact
//! set of roles it admits, so a President is not implicitly a Secretary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three fixed organisation roles.
///
/// Declaration order mirrors the backend enum, which is also the order the
/// officer directory is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Runs the organisation and approves spending.
    President,
    /// Reviews finances and the audit trail.
    Auditor,
    /// Keeps records, events and announcements.
    Secretary,
}

impl Role {
    /// Every role, in backend enum order.
    pub const ALL: [Self; 3] = [Self::President, Self::Auditor, Self::Secretary];

    /// Backend spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::President => "President",
            Self::Auditor => "Auditor",
            Self::Secretary => "Secretary",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::President => 0b001,
            Self::Auditor => 0b010,
            Self::Secretary => 0b100,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not one of the fixed roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRoleError(String);

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownRoleError(value.to_owned()))
    }
}

/// Explicit set of roles allowed to perform an operation.
///
/// # Examples
/// ```
/// use sbo_dashboard::domain::{Role, RoleSet};
///
/// let writers = RoleSet::only(Role::President).with(Role::Secretary);
/// assert!(writers.contains(Role::Secretary));
/// assert!(!writers.contains(Role::Auditor));
/// assert_eq!(writers.to_string(), "President or Secretary");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Set that admits nobody.
    pub const NONE: Self = Self(0);

    /// Set admitting a single role.
    #[must_use]
    pub const fn only(role: Role) -> Self {
        Self(role.bit())
    }

    /// Extend the set with another role.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Whether `role` is admitted.
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Whether the set admits nobody.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Admitted roles in backend enum order.
    pub fn roles(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().map(Role::as_str).collect();
        match names.as_slice() {
            [] => f.write_str("nobody"),
            [single] => f.write_str(single),
            [init @ .., last] => write!(f, "{} or {last}", init.join(", ")),
        }
    }
}
