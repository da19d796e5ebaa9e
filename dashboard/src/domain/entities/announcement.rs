//! Announcements posted to members or the public.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// A notice posted by an officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Whether non-members may see the announcement.
    #[serde(default)]
    pub is_public: bool,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Officer who posted it.
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Fields supplied when posting an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementDraft {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Whether non-members may see the announcement.
    pub is_public: bool,
}

/// Partial announcement update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnouncementPatch {
    /// New headline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl Draft<Announcement> for AnnouncementDraft {
    fn validate(&self, _existing: &[Announcement]) -> Result<(), DomainError> {
        required_text("title", &self.title)?;
        required_text("content", &self.content)
    }
}

impl Patch<Announcement> for AnnouncementPatch {
    fn validate(&self, _id: Uuid, _existing: &[Announcement]) -> Result<(), DomainError> {
        optional_text("title", self.title.as_deref())?;
        optional_text("content", self.content.as_deref())
    }
}

impl Resource for Announcement {
    type Draft = AnnouncementDraft;
    type Patch = AnnouncementPatch;

    const TABLE: Table = Table::Announcements;
    const NOUN: &'static str = "announcement";
    const PLURAL: &'static str = "announcements";
    const ORDER: OrderBy = OrderBy::descending("created_at");
    const PLACEMENT: Placement = Placement::Prepend;
    const WRITE: WritePolicy =
        WritePolicy::uniform(RoleSet::only(Role::President).with(Role::Secretary));

    fn id(&self) -> Uuid {
        self.id
    }
}
