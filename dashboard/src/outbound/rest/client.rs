//! Shared reqwest client for the hosted backend.
//!
//! Every adapter in this module talks to the same base URL with the same
//! credentials, so the client carries them as default headers and exposes
//! one `execute` helper that reads the body and classifies failures.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use zeroize::Zeroizing;

const API_KEY_HEADER: &str = "apikey";
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Credentials presented on every request.
pub struct Credentials {
    /// Project key sent as the `apikey` header.
    pub anon_key: Zeroizing<String>,
    /// Session token sent as a bearer token; the anon key is used when absent.
    pub access_token: Option<Zeroizing<String>>,
}

/// Failure to build a [`BackendClient`].
#[derive(Debug, thiserror::Error)]
pub enum BackendClientError {
    /// A key or token could not be sent as a header.
    #[error("credential is not a valid header value")]
    InvalidCredential(#[from] InvalidHeaderValue),
    /// The base URL cannot be extended with path segments.
    #[error("base URL cannot carry path segments: {0}")]
    InvalidBaseUrl(Url),
    /// The HTTP client could not be constructed.
    #[error("http client could not be built: {0}")]
    Build(#[from] reqwest::Error),
}

/// Transport-level outcome of a failed call, before mapping to a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallFailure {
    Transport(String),
    Status { status: u16, message: String },
}

/// Authenticated HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

impl BackendClient {
    /// Build a client with credentials installed as sensitive default headers.
    ///
    /// # Errors
    ///
    /// Returns [`BackendClientError`] when a credential is not a valid header
    /// value, the base URL cannot be extended with path segments, or the
    /// reqwest client cannot be constructed.
    pub fn new(
        base: Url,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, BackendClientError> {
        if base.cannot_be_a_base() {
            return Err(BackendClientError::InvalidBaseUrl(base));
        }
        let bearer = credentials
            .access_token
            .as_ref()
            .unwrap_or(&credentials.anon_key);
        let mut api_key = HeaderValue::from_str(credentials.anon_key.as_str())?;
        api_key.set_sensitive(true);
        let mut authorization =
            HeaderValue::from_str(Zeroizing::new(format!("Bearer {}", bearer.as_str())).as_str())?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(AUTHORIZATION, authorization);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base })
    }

    pub(crate) const fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Send `request` and return the body of a successful response.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, CallFailure> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

/// Append `segments` to `base`, percent-encoding each one.
pub(crate) fn endpoint<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Option<Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Some(url)
}

fn map_transport_error(error: reqwest::Error) -> CallFailure {
    if error.is_timeout() {
        CallFailure::Transport(format!("request timed out: {error}"))
    } else {
        CallFailure::Transport(error.to_string())
    }
}

pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> CallFailure {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            CallFailure::Transport(message)
        }
        _ => CallFailure::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
