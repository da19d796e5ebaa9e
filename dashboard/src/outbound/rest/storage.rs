//! `ObjectStore` over the backend's storage API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};

use super::client::{BackendClient, CallFailure, endpoint};
use crate::domain::ports::{Bucket, ObjectStore, ObjectStoreError};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

impl From<CallFailure> for ObjectStoreError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(message) => Self::transport(message),
            CallFailure::Status { status, message } => Self::rejected(status, message),
        }
    }
}

/// Object store backed by [`BackendClient`].
#[derive(Debug, Clone)]
pub struct RestObjectStore {
    client: BackendClient,
}

impl RestObjectStore {
    /// Store objects through `client`.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

/// Split an object path into non-empty segments.
fn path_segments(path: &str) -> Result<Vec<&str>, ObjectStoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(ObjectStoreError::invalid_path(path));
    }
    Ok(segments)
}

fn object_url(
    base: &Url,
    prefix: &[&str],
    bucket: Bucket,
    path: &str,
) -> Result<Url, ObjectStoreError> {
    let segments = path_segments(path)?;
    let all = ["storage", "v1", "object"]
        .into_iter()
        .chain(prefix.iter().copied())
        .chain([bucket.as_str()])
        .chain(segments);
    endpoint(base, all).ok_or_else(|| ObjectStoreError::invalid_path(path))
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<(), ObjectStoreError> {
        let url = object_url(self.client.base(), &[], bucket, path)?;
        let mime = content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
        let request = self
            .client
            .request(Method::POST, url)
            .header(CONTENT_TYPE, mime)
            .body(bytes);
        self.client.execute(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> Result<Url, ObjectStoreError> {
        object_url(self.client.base(), &["public"], bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn base() -> Url {
        Url::parse("https://project.example.test").expect("valid url")
    }

    #[rstest]
    fn public_url_addresses_the_public_object(base: Url) {
        let url = object_url(&base, &["public"], Bucket::Receipts, "user-1/expense-9.pdf")
            .expect("valid path");
        assert_eq!(
            url.as_str(),
            "https://project.example.test/storage/v1/object/public/receipts/user-1/expense-9.pdf"
        );
    }

    #[rstest]
    fn upload_url_omits_public_segment(base: Url) {
        let url = object_url(&base, &[], Bucket::OfficerAvatars, "1740000000000.png")
            .expect("valid path");
        assert_eq!(
            url.path(),
            "/storage/v1/object/officer-avatars/1740000000000.png"
        );
    }

    #[rstest]
    #[case("")]
    #[case("user//file.pdf")]
    #[case("../escape.pdf")]
    #[case("user/")]
    fn malformed_paths_are_rejected(base: Url, #[case] path: &str) {
        let error = object_url(&base, &[], Bucket::Documents, path).expect_err("invalid");
        assert_eq!(error, ObjectStoreError::invalid_path(path));
    }
}
