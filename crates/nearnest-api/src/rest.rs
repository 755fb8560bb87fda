use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use nearnest_types::api::PostgrestError;
use nearnest_types::models::Table;

use crate::error::ApiError;

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// HTTP client for the PostgREST endpoint.
#[derive(Clone, Debug)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Start a read on `table`.
    pub fn from(&self, table: Table) -> Query<'_> {
        Query {
            rest: self,
            table,
            params: Vec::new(),
        }
    }

    /// Insert one row without reading it back.
    pub async fn insert<T: Serialize>(&self, table: Table, row: &T, token: &str) -> Result<(), ApiError> {
        let response = self
            .request(self.client.post(self.table_url(table)), token)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    /// Insert one row and read back `columns` of the stored row.
    pub async fn insert_returning<T, R>(
        &self,
        table: Table,
        row: &T,
        columns: &str,
        token: &str,
    ) -> Result<R, ApiError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .request(self.client.post(self.table_url(table)), token)
            .query(&[("select", columns)])
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let mut rows: Vec<R> = check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(ApiError::Backend {
                status: 200,
                code: None,
                message: format!("insert into {} returned no row", table.as_str()),
            });
        }
        Ok(rows.swap_remove(0))
    }

    /// Partial update of the rows where `column` equals `value`.
    pub async fn update_eq<T: Serialize>(
        &self,
        table: Table,
        patch: &T,
        column: &str,
        value: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .request(self.client.patch(self.table_url(table)), token)
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table.as_str())
    }

    fn request(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header("apikey", &self.api_key).bearer_auth(token)
    }
}

/// A filtered, ordered read of one table.
pub struct Query<'a> {
    rest: &'a RestClient,
    table: Table,
    params: Vec<(String, String)>,
}

impl Query<'_> {
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{}", value)));
        self
    }

    pub fn neq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("neq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("gte.{}", value)));
        self
    }

    /// Raw PostgREST `or` expression, without the surrounding parentheses.
    pub fn or(mut self, expression: &str) -> Self {
        self.params.push(("or".into(), format!("({})", expression)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params.push(("order".into(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    pub async fn fetch<T: DeserializeOwned>(self, token: &str) -> Result<Vec<T>, ApiError> {
        debug!("GET {} {:?}", self.table.as_str(), self.params);
        let response = self
            .rest
            .request(self.rest.client.get(self.rest.table_url(self.table)), token)
            .query(&self.params)
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Zero or one row. More than one is treated as the first.
    pub async fn maybe_single<T: DeserializeOwned>(self, token: &str) -> Result<Option<T>, ApiError> {
        let rows: Vec<T> = self.limit(1).fetch(token).await?;
        Ok(rows.into_iter().next())
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(error_from_response(response).await)
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let body: PostgrestError = serde_json::from_str(&text).unwrap_or_else(|_| PostgrestError {
        message: text.clone(),
        ..Default::default()
    });

    if body.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return ApiError::UniqueViolation(body.message);
    }

    ApiError::Backend {
        status,
        code: body.code,
        message: body.message,
    }
}
