//! Port for reading a user's assigned role.

use async_trait::async_trait;

use crate::domain::{Role, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by role directory adapters.
    pub enum RoleDirectoryError {
        /// The lookup could not be delivered.
        Transport {
            /// Detail reported by the adapter.
            message: String,
        } => "role lookup failed: {message}",
        /// The backend refused the lookup.
        Rejected {
            /// HTTP status returned by the backend.
            status: u16,
            /// Detail reported by the adapter.
            message: String,
        } => "role lookup rejected with status {status}: {message}",
        /// The stored role is not one of the fixed roles.
        Decode {
            /// Detail reported by the adapter.
            message: String,
        } => "role lookup returned an unreadable role: {message}",
    }
}

/// Port resolving the single role assigned to a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Role assigned to `user_id`, or `None` when the user has not picked one.
    async fn role_for(&self, user_id: &UserId) -> Result<Option<Role>, RoleDirectoryError>;
}
