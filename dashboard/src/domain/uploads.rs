//! Single-file uploads to object storage.
//!
//! Each flow checks the session's role, stores the bytes under a
//! deterministic path and returns the public URL. Document uploads also
//! record a [`Document`] row through the document accessor.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::error;
use url::Url;
use uuid::Uuid;

use crate::domain::accessor::{ResourceAccessor, denial_message};
use crate::domain::entities::{Document, DocumentDraft, Expense, Officer};
use crate::domain::ports::{Bucket, Notice, Notifier, ObjectStore, ObjectStoreError};
use crate::domain::resource::Resource;
use crate::domain::{DomainError, RoleSet, Session};

const DEFAULT_EXTENSION: &str = "bin";

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name; only its extension is kept.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// MIME type, if known.
    pub content_type: Option<String>,
}

impl UploadFile {
    /// Extension after the final `.`, or `bin` when there is none.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(_, extension)| extension)
            .filter(|extension| !extension.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
    }
}

/// Metadata recorded alongside an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDetails {
    /// Display title.
    pub title: String,
    /// Optional grouping label.
    pub category: Option<String>,
    /// Whether non-members may see the document.
    pub is_public: bool,
}

fn map_store_error(error: ObjectStoreError) -> DomainError {
    match error {
        ObjectStoreError::Transport { message } => {
            DomainError::service_unavailable(format!("storage unavailable: {message}"))
        }
        ObjectStoreError::Rejected { status, message } => {
            DomainError::internal(format!("storage rejected the upload: {message}"))
                .with_details(json!({ "status": status }))
        }
        ObjectStoreError::InvalidPath { path } => {
            DomainError::internal(format!("storage path is not addressable: {path}"))
        }
    }
}

/// Upload flows bound to one session.
pub struct Uploads {
    session: Session,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl Uploads {
    /// Bind upload flows to `session`.
    #[must_use]
    pub const fn new(
        session: Session,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            store,
            notifier,
            clock,
        }
    }

    /// Rebind to another session.
    pub const fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    /// Store an expense receipt at `{user_id}/{expense_id}.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] unless the session
    /// may create expenses, or the mapped storage failure.
    pub async fn upload_receipt(
        &self,
        expense_id: Uuid,
        file: UploadFile,
    ) -> Result<Url, DomainError> {
        self.authorize(Expense::WRITE.create, "receipts")?;
        let path = format!(
            "{}/{expense_id}.{}",
            self.session.user_id(),
            file.extension()
        );
        self.store_file(Bucket::Receipts, &path, file, "receipt")
            .await
    }

    /// Store an officer portrait at `{millis}.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] unless the session
    /// may manage officers, or the mapped storage failure.
    pub async fn upload_officer_avatar(&self, file: UploadFile) -> Result<Url, DomainError> {
        self.authorize(Officer::WRITE.create, "officer avatars")?;
        let path = format!("{}.{}", self.clock.utc().timestamp_millis(), file.extension());
        self.store_file(Bucket::OfficerAvatars, &path, file, "avatar")
            .await
    }

    /// Store a document at `{user_id}/{millis}.{ext}` and record it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] unless the session
    /// may create documents, the mapped storage failure, or any failure
    /// raised while creating the document row.
    pub async fn upload_document(
        &self,
        documents: &mut ResourceAccessor<Document>,
        file: UploadFile,
        details: DocumentDetails,
    ) -> Result<Document, DomainError> {
        self.authorize(Document::WRITE.create, "documents")?;
        let path = format!(
            "{}/{}.{}",
            self.session.user_id(),
            self.clock.utc().timestamp_millis(),
            file.extension()
        );
        let file_type = file.content_type.clone();
        let file_size = i64::try_from(file.bytes.len()).ok();
        let url = self
            .store_file(Bucket::Documents, &path, file, "file")
            .await?;

        let DocumentDetails {
            title,
            category,
            is_public,
        } = details;
        documents
            .create(&DocumentDraft {
                title,
                file_url: url.into(),
                file_type,
                file_size,
                category,
                is_public,
            })
            .await
    }

    fn authorize(&self, allowed: RoleSet, plural: &str) -> Result<(), DomainError> {
        if self.session.has_any(allowed) {
            return Ok(());
        }
        let message = denial_message(allowed, "upload", plural);
        self.notifier.notify(Notice::error(message.as_str()));
        Err(DomainError::forbidden(message))
    }

    async fn store_file(
        &self,
        bucket: Bucket,
        path: &str,
        file: UploadFile,
        noun: &str,
    ) -> Result<Url, DomainError> {
        let UploadFile {
            bytes,
            content_type,
            ..
        } = file;
        let stored = match self.store.upload(bucket, path, bytes, content_type).await {
            Ok(()) => self.store.public_url(bucket, path),
            Err(error) => Err(error),
        };
        stored.map_err(|store_error| {
            error!(
                bucket = bucket.as_str(),
                path,
                error = %store_error,
                "upload failed"
            );
            self.notifier
                .notify(Notice::error(format!("Failed to upload {noun}")));
            map_store_error(store_error)
        })
    }
}
