//! Officer directory entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// An officer shown in the public directory.
///
/// `role` is an org-chart label. It is unrelated to the role held by the
/// signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Office held.
    pub role: Role,
    /// Contact address.
    pub email: String,
    /// Short biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Public URL of the portrait.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// First day in office.
    pub term_start: NaiveDate,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when adding an officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerDraft {
    /// Display name.
    pub name: String,
    /// Office held.
    pub role: Role,
    /// Contact address.
    pub email: String,
    /// Short biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Public URL of the portrait.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// First day in office.
    pub term_start: NaiveDate,
}

/// Partial officer update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OfficerPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New office.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// New contact address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New portrait URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// New first day in office.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_start: Option<NaiveDate>,
}

fn plausible_email(email: &str) -> Result<(), DomainError> {
    required_text("email", email)?;
    let valid = email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(DomainError::invalid_request("email must be a valid address")
            .with_details(json!({ "field": "email" })))
    }
}

impl Draft<Officer> for OfficerDraft {
    fn validate(&self, _existing: &[Officer]) -> Result<(), DomainError> {
        required_text("name", &self.name)?;
        plausible_email(&self.email)
    }
}

impl Patch<Officer> for OfficerPatch {
    fn validate(&self, _id: Uuid, _existing: &[Officer]) -> Result<(), DomainError> {
        optional_text("name", self.name.as_deref())?;
        self.email.as_deref().map_or(Ok(()), plausible_email)
    }
}

impl Resource for Officer {
    type Draft = OfficerDraft;
    type Patch = OfficerPatch;

    const TABLE: Table = Table::Officers;
    const NOUN: &'static str = "officer";
    const PLURAL: &'static str = "officers";
    const ORDER: OrderBy = OrderBy::ascending("role");
    const PLACEMENT: Placement = Placement::Append;
    const WRITE: WritePolicy = WritePolicy::uniform(RoleSet::only(Role::President));
    const OWNED: bool = false;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("president@sbo.edu", true)]
    #[case("no-at-sign", false)]
    #[case("@sbo.edu", false)]
    #[case("secretary@localhost", false)]
    fn email_check_is_shallow(#[case] email: &str, #[case] accepted: bool) {
        assert_eq!(plausible_email(email).is_ok(), accepted);
    }
}
