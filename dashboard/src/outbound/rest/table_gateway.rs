//! `TableGateway` over the backend's REST table API.
//!
//! Selects translate to `GET /rest/v1/{table}` with `select`, `order`,
//! `limit` and one `column=op.value` pair per filter. Mutations ask for the
//! affected row back with `Prefer: return=representation`.

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;
use uuid::Uuid;

use super::client::{BackendClient, CallFailure, endpoint};
use crate::domain::ports::{Filter, SelectQuery, Table, TableGateway, TableGatewayError};

const PREFER_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

impl From<CallFailure> for TableGatewayError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(message) => Self::transport(message),
            CallFailure::Status { status, message } => Self::rejected(status, message),
        }
    }
}

/// Table gateway backed by [`BackendClient`].
#[derive(Debug, Clone)]
pub struct RestTableGateway {
    client: BackendClient,
}

impl RestTableGateway {
    /// Read and write tables through `client`.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn table_url(&self, table: Table) -> Result<Url, TableGatewayError> {
        table_url(self.client.base(), table)
    }
}

fn table_url(base: &Url, table: Table) -> Result<Url, TableGatewayError> {
    endpoint(base, ["rest", "v1", table.as_str()])
        .ok_or_else(|| TableGatewayError::transport(format!("no endpoint for table {table}")))
}

fn select_url(base: &Url, table: Table, query: &SelectQuery) -> Result<Url, TableGatewayError> {
    let mut url = table_url(base, table)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        let direction = if query.order.ascending { "asc" } else { "desc" };
        pairs.append_pair("order", &format!("{}.{direction}", query.order.column));
        if let Some(limit) = query.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
        for filter in &query.filters {
            let (operator, value) = match filter {
                Filter::Eq { value, .. } => ("eq", value),
                Filter::Gte { value, .. } => ("gte", value),
                Filter::Lte { value, .. } => ("lte", value),
            };
            pairs.append_pair(filter.column(), &format!("{operator}.{value}"));
        }
    }
    Ok(url)
}

fn row_url(base: &Url, table: Table, id: Uuid) -> Result<Url, TableGatewayError> {
    let mut url = table_url(base, table)?;
    url.query_pairs_mut()
        .append_pair("id", &format!("eq.{id}"));
    Ok(url)
}

fn decode_rows(body: &[u8]) -> Result<Vec<Value>, TableGatewayError> {
    serde_json::from_slice(body).map_err(|error| {
        TableGatewayError::decode(format!("expected a JSON array of rows: {error}"))
    })
}

/// First row of a representation response.
///
/// An empty representation means the filter matched nothing, which the
/// backend reports as 406 when a single row is requested.
fn single_row(body: &[u8]) -> Result<Value, TableGatewayError> {
    decode_rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| TableGatewayError::rejected(406_u16, "no rows returned"))
}

#[async_trait]
impl TableGateway for RestTableGateway {
    async fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, TableGatewayError> {
        let url = select_url(self.client.base(), table, query)?;
        let body = self.client.execute(self.client.request(Method::GET, url)).await?;
        decode_rows(&body)
    }

    async fn insert(&self, table: Table, row: &Value) -> Result<Value, TableGatewayError> {
        let request = self
            .client
            .request(Method::POST, self.table_url(table)?)
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(row);
        let body = self.client.execute(request).await?;
        single_row(&body)
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: &Value,
    ) -> Result<Value, TableGatewayError> {
        let request = self
            .client
            .request(Method::PATCH, row_url(self.client.base(), table, id)?)
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(changes);
        let body = self.client.execute(request).await?;
        single_row(&body)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), TableGatewayError> {
        let request = self
            .client
            .request(Method::DELETE, row_url(self.client.base(), table, id)?);
        self.client.execute(request).await?;
        Ok(())
    }
}
