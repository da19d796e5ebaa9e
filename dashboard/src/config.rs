//! Backend connection settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SBO_*` environment variables or a config
//! file, in the usual OrthoConfig precedence.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{SpendBasis, UserId, UserIdValidationError};
use crate::outbound::rest::Credentials;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings that are missing or malformed.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A required setting is absent.
    #[error("{0} is not configured")]
    Missing(&'static str),
    /// The API URL could not be parsed.
    #[error("api_url is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The user id is malformed.
    #[error(transparent)]
    InvalidUserId(#[from] UserIdValidationError),
}

/// Where the hosted backend lives and who is calling it.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SBO")]
pub struct BackendSettings {
    /// Base URL of the hosted backend project.
    pub api_url: Option<String>,
    /// Public project key.
    pub anon_key: Option<String>,
    /// Signed-in user's access token.
    pub access_token: Option<String>,
    /// Signed-in user's identifier.
    pub user_id: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
    /// Count only approved expenses toward spend.
    #[ortho_config(default = false)]
    pub approved_only_spend: bool,
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("api_url", &self.api_url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user_id", &self.user_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("approved_only_spend", &self.approved_only_spend)
            .finish()
    }
}

impl BackendSettings {
    /// Parsed backend base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is unset or unparsable.
    pub fn api_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .api_url
            .as_deref()
            .ok_or(SettingsError::Missing("api_url"))?;
        Ok(Url::parse(raw)?)
    }

    /// Credentials for the backend client, wiped from memory on drop.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when the anon key is unset.
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        let anon_key = self
            .anon_key
            .as_ref()
            .ok_or(SettingsError::Missing("anon_key"))?;
        Ok(Credentials {
            anon_key: Zeroizing::new(anon_key.clone()),
            access_token: self.access_token.clone().map(Zeroizing::new),
        })
    }

    /// Identity the session is resolved for.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the id is unset or not a UUID.
    pub fn user_id(&self) -> Result<UserId, SettingsError> {
        let raw = self
            .user_id
            .as_deref()
            .ok_or(SettingsError::Missing("user_id"))?;
        Ok(UserId::new(raw)?)
    }

    /// Request timeout; zero falls back to the default.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }

    /// Which expenses count toward spend.
    #[must_use]
    pub const fn spend_basis(&self) -> SpendBasis {
        SpendBasis::from_approved_only(self.approved_only_spend)
    }
}
