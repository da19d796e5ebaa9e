//! Scheduled organisation events.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// A scheduled organisation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Primary key.
    pub id: Uuid,
    /// Event name.
    pub title: String,
    /// Free-form details.
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar day of the event.
    pub event_date: NaiveDate,
    /// Start time, when known.
    #[serde(default)]
    pub event_time: Option<NaiveTime>,
    /// Venue.
    #[serde(default)]
    pub location: Option<String>,
    /// Whether non-members may see the event.
    #[serde(default)]
    pub is_public: bool,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Officer who scheduled it.
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Fields supplied when scheduling an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDraft {
    /// Event name.
    pub title: String,
    /// Free-form details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Calendar day of the event.
    pub event_date: NaiveDate,
    /// Start time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    /// Venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Whether non-members may see the event.
    pub is_public: bool,
}

/// Partial event update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventPatch {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    /// New start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    /// New venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl Draft<Event> for EventDraft {
    fn validate(&self, _existing: &[Event]) -> Result<(), DomainError> {
        required_text("title", &self.title)
    }
}

impl Patch<Event> for EventPatch {
    fn validate(&self, _id: Uuid, _existing: &[Event]) -> Result<(), DomainError> {
        optional_text("title", self.title.as_deref())
    }
}

impl Resource for Event {
    type Draft = EventDraft;
    type Patch = EventPatch;

    const TABLE: Table = Table::Events;
    const NOUN: &'static str = "event";
    const PLURAL: &'static str = "events";
    const ORDER: OrderBy = OrderBy::ascending("event_date");
    const PLACEMENT: Placement = Placement::Sorted;
    const WRITE: WritePolicy =
        WritePolicy::uniform(RoleSet::only(Role::President).with(Role::Secretary));
    const AUDITED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn placement_cmp(&self, other: &Self) -> Ordering {
        self.event_date.cmp(&other.event_date)
    }
}
