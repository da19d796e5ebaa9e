//! Port for single-file uploads to object storage.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object store adapters.
    pub enum ObjectStoreError {
        /// The upload could not be delivered.
        Transport {
            /// Detail reported by the adapter.
            message: String,
        } => "storage request failed: {message}",
        /// Storage refused the object.
        Rejected {
            /// HTTP status returned by the backend.
            status: u16,
            /// Detail reported by the adapter.
            message: String,
        } => "storage request rejected with status {status}: {message}",
        /// The object path could not be expressed as a URL.
        InvalidPath {
            /// Offending object path.
            path: String,
        } => "invalid storage path: {path}",
    }
}

/// Storage buckets used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Expense receipts.
    Receipts,
    /// Officer portraits.
    OfficerAvatars,
    /// Organisation documents.
    Documents,
}

impl Bucket {
    /// Bucket name in object storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipts => "receipts",
            Self::OfficerAvatars => "officer-avatars",
            Self::Documents => "documents",
        }
    }
}

/// Port for PUT-then-read-URL uploads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), ObjectStoreError>;

    /// Public URL under which an uploaded object is readable.
    fn public_url(&self, bucket: Bucket, path: &str) -> Result<Url, ObjectStoreError>;
}
