//! `RoleDirectory` over the `user_roles` table.

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;

use super::client::{BackendClient, CallFailure, endpoint};
use crate::domain::ports::{RoleDirectory, RoleDirectoryError, Table};
use crate::domain::{Role, UserId};

impl From<CallFailure> for RoleDirectoryError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(message) => Self::transport(message),
            CallFailure::Status { status, message } => Self::rejected(status, message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: String,
}

/// Role lookup backed by [`BackendClient`].
#[derive(Debug, Clone)]
pub struct RestRoleDirectory {
    client: BackendClient,
}

impl RestRoleDirectory {
    /// Look roles up through `client`.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

fn lookup_url(base: &Url, user_id: &UserId) -> Option<Url> {
    let mut url = endpoint(base, ["rest", "v1", Table::UserRoles.as_str()])?;
    url.query_pairs_mut()
        .append_pair("select", "role")
        .append_pair("user_id", &format!("eq.{user_id}"))
        .append_pair("limit", "1");
    Some(url)
}

fn decode_role(body: &[u8]) -> Result<Option<Role>, RoleDirectoryError> {
    let rows: Vec<RoleRow> = serde_json::from_slice(body)
        .map_err(|error| RoleDirectoryError::decode(format!("invalid role rows: {error}")))?;
    rows.into_iter()
        .next()
        .map(|row| row.role.parse::<Role>())
        .transpose()
        .map_err(|error| RoleDirectoryError::decode(error.to_string()))
}

#[async_trait]
impl RoleDirectory for RestRoleDirectory {
    async fn role_for(&self, user_id: &UserId) -> Result<Option<Role>, RoleDirectoryError> {
        let url = lookup_url(self.client.base(), user_id)
            .ok_or_else(|| RoleDirectoryError::transport("no endpoint for role lookup"))?;
        let body = self
            .client
            .execute(self.client.request(Method::GET, url))
            .await?;
        decode_role(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(br#"[{"role":"Auditor"}]"#.as_slice(), Some(Role::Auditor))]
    #[case(br#"[{"role":"President"},{"role":"Secretary"}]"#.as_slice(), Some(Role::President))]
    #[case(b"[]".as_slice(), None)]
    fn decodes_first_role(#[case] body: &[u8], #[case] expected: Option<Role>) {
        assert_eq!(decode_role(body).expect("decodes"), expected);
    }

    #[rstest]
    fn unknown_role_is_a_decode_error() {
        let error = decode_role(br#"[{"role":"Treasurer"}]"#).expect_err("unknown role");
        assert!(matches!(error, RoleDirectoryError::Decode { .. }));
    }

    #[rstest]
    fn lookup_filters_by_user() {
        let base = Url::parse("https://project.example.test").expect("valid url");
        let user = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");

        let url = lookup_url(&base, &user).expect("url builds");

        assert_eq!(url.path(), "/rest/v1/user_roles");
        assert_eq!(
            url.query(),
            Some("select=role&user_id=eq.3fa85f64-5717-4562-b3fc-2c963f66afa6&limit=1")
        );
    }
}
