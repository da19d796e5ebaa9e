//! Stored documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::domain::ports::{OrderBy, Table};
use crate::domain::resource::{Draft, Patch, Placement, Resource, WritePolicy};
use crate::domain::{DomainError, Role, RoleSet};

/// Metadata row for a file held in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Primary key.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Public URL of the stored file.
    pub file_url: String,
    /// MIME type reported at upload.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: Option<i64>,
    /// Optional grouping label.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether non-members may see the document.
    #[serde(default)]
    pub is_public: bool,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Officer who uploaded it.
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Fields supplied when registering a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDraft {
    /// Display title.
    pub title: String,
    /// Public URL of the stored file.
    pub file_url: String,
    /// MIME type reported at upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    /// Optional grouping label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether non-members may see the document.
    pub is_public: bool,
}

/// Partial document update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentPatch {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New grouping label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl Draft<Document> for DocumentDraft {
    fn validate(&self, _existing: &[Document]) -> Result<(), DomainError> {
        required_text("title", &self.title)?;
        required_text("file_url", &self.file_url)
    }
}

impl Patch<Document> for DocumentPatch {
    fn validate(&self, _id: Uuid, _existing: &[Document]) -> Result<(), DomainError> {
        optional_text("title", self.title.as_deref())
    }
}

impl Resource for Document {
    type Draft = DocumentDraft;
    type Patch = DocumentPatch;

    const TABLE: Table = Table::Documents;
    const NOUN: &'static str = "document";
    const PLURAL: &'static str = "documents";
    const ORDER: OrderBy = OrderBy::descending("created_at");
    const PLACEMENT: Placement = Placement::Prepend;
    const WRITE: WritePolicy = WritePolicy::uniform(
        RoleSet::only(Role::President)
            .with(Role::Secretary)
            .with(Role::Auditor),
    );
    const AUDITED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
}
