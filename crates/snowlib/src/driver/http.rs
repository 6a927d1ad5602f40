//! SQL API v2 over HTTPS

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use url::Url;
use uuid::Uuid;

use super::{
    Cell, Driver, PartitionResponse, Statement, StatementRequest, StatementResponse,
    StatementState, encode_bindings, statement_error,
};
use crate::auth::{AuthMethod, Credentials, KeyPairAuth, login, logout};
use crate::config::ConnectionParams;
use crate::constants::{MULTI_STATEMENT_COUNT, STATEMENTS_PATH};
use crate::{Error, Result};

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const APPLICATION_JSON: &str = "application/json";

/// Driver for `https://<account>.snowflakecomputing.com/api/v2/statements`
pub struct HttpDriver {
    client: Client,
    base_url: Url,
    params: ConnectionParams,
    credentials: Credentials,
}

impl fmt::Debug for HttpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDriver")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.params.user)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn default_headers() -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    let agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&agent).map_err(|e| Error::config(e.to_string()))?,
    );
    Ok(headers)
}

impl HttpDriver {
    /// Authenticate and return a ready driver
    pub async fn connect(params: ConnectionParams) -> Result<Self> {
        let base_url = params.base_url()?;
        let client = Client::builder()
            .default_headers(default_headers()?)
            .gzip(true)
            .build()?;

        let credentials = match &params.auth {
            AuthMethod::KeyPair(config) => {
                Credentials::KeyPair(KeyPairAuth::load(&params.account, &params.user, config)?)
            }
            AuthMethod::Password(password) => {
                Credentials::Session(login(&client, &base_url, &params, password).await?)
            }
        };

        tracing::info!(
            url = %base_url,
            user = %params.user,
            key_pair = params.auth.is_key_pair(),
            "Connected to Snowflake"
        );

        Ok(Self {
            client,
            base_url,
            params,
            credentials,
        })
    }

    fn url(&self, suffix: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{STATEMENTS_PATH}{suffix}"))
            .map_err(|e| Error::config(format!("Invalid statement URL: {e}")))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let (authorization, token_type) = self.credentials.authorization()?;
        let request = request.header(AUTHORIZATION, authorization);
        Ok(match token_type {
            Some(token_type) => request.header(TOKEN_TYPE_HEADER, token_type),
            None => request,
        })
    }

    fn request_body<'a>(&'a self, statement: &'a Statement) -> StatementRequest<'a> {
        let mut parameters: BTreeMap<String, serde_json::Value> = self
            .params
            .session_parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(count) = statement.multi_statement_count {
            parameters.insert(
                MULTI_STATEMENT_COUNT.to_string(),
                serde_json::Value::String(count.to_string()),
            );
        }

        StatementRequest {
            statement: &statement.sql,
            timeout: self.params.timeout.map(|t| t.as_secs()),
            database: self.params.database.as_deref(),
            schema: self.params.schema.as_deref(),
            warehouse: self.params.warehouse.as_deref(),
            role: self.params.role.as_deref(),
            bindings: encode_bindings(&statement.bindings),
            parameters,
        }
    }

    fn reject_file_transfer(statement: &Statement) -> Result<()> {
        if statement.is_file_transfer() {
            return Err(Error::NotSupported(
                "PUT/GET file transfer is not available over the SQL API".to_string(),
            ));
        }
        Ok(())
    }

    async fn post_statement(&self, statement: &Statement, run_async: bool) -> Result<Response> {
        Self::reject_file_transfer(statement)?;

        let mut url = self.url("")?;
        url.query_pairs_mut()
            .append_pair("requestId", &Uuid::new_v4().to_string());
        if run_async {
            url.query_pairs_mut().append_pair("async", "true");
        }

        tracing::debug!(sql = %statement.sql, bindings = statement.bindings.len(), "Submitting statement");
        let request = self
            .authorized(self.client.post(url))?
            .json(&self.request_body(statement));
        Ok(request.send().await?)
    }
}

/// Decode a statement response by HTTP status
async fn read_state(response: Response) -> Result<StatementState> {
    let status = response.status();
    if status == StatusCode::OK {
        let body: StatementResponse = response.json().await?;
        return Ok(StatementState::Complete(Box::new(body)));
    }
    if status == StatusCode::ACCEPTED {
        return Ok(StatementState::Running);
    }

    let text = response.text().await?;
    match serde_json::from_str::<StatementResponse>(&text) {
        Ok(body) if body.code.is_some() || body.message.is_some() => {
            Err(statement_error(&body, status.as_str()))
        }
        _ => Err(Error::Snowflake {
            code: status.as_u16().to_string(),
            sql_state: String::new(),
            message: if text.is_empty() {
                status.to_string()
            } else {
                text
            },
            query_id: None,
        }),
    }
}

#[async_trait]
impl Driver for HttpDriver {
    async fn execute(&self, statement: &Statement) -> Result<StatementResponse> {
        let response = self.post_statement(statement, false).await?;
        if response.status() == StatusCode::ACCEPTED {
            // Long-running statements return a handle after the server-side wait
            let body: StatementResponse = response.json().await?;
            let handle = body
                .statement_handle
                .ok_or_else(|| Error::invalid_argument("Accepted statement has no handle"))?;
            return self.wait(&handle).await;
        }

        match read_state(response).await? {
            StatementState::Complete(body) => Ok(*body),
            StatementState::Running => Err(Error::invalid_argument(
                "Statement reported running without a handle",
            )),
        }
    }

    async fn submit(&self, statement: &Statement) -> Result<String> {
        let response = self.post_statement(statement, true).await?;
        let status = response.status();
        if !status.is_success() {
            read_state(response).await?;
            return Err(Error::invalid_argument(format!(
                "Unexpected status {status} submitting statement"
            )));
        }

        let body: StatementResponse = response.json().await?;
        body.statement_handle
            .ok_or_else(|| Error::invalid_argument("Submitted statement has no handle"))
    }

    async fn status(&self, handle: &str) -> Result<StatementState> {
        let url = self.url(&format!("/{handle}"))?;
        let response = self.authorized(self.client.get(url))?.send().await?;
        read_state(response).await
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<Vec<Cell>>> {
        let mut url = self.url(&format!("/{handle}"))?;
        url.query_pairs_mut()
            .append_pair("partition", &partition.to_string());

        let response = self.authorized(self.client.get(url))?.send().await?;
        if response.status() != StatusCode::OK {
            read_state(response).await?;
            return Err(Error::invalid_argument(format!(
                "Partition {partition} of {handle} is not available"
            )));
        }

        let body: PartitionResponse = response.json().await?;
        Ok(body.data)
    }

    async fn cancel(&self, handle: &str) -> Result<()> {
        let url = self.url(&format!("/{handle}/cancel"))?;
        let response = self.authorized(self.client.post(url))?.send().await?;
        if !response.status().is_success() {
            read_state(response).await?;
        }
        tracing::debug!(handle, "Cancelled statement");
        Ok(())
    }

    fn supports_file_transfer(&self) -> bool {
        false
    }

    async fn close(&self) -> Result<()> {
        if let Credentials::Session(token) = &self.credentials {
            logout(&self.client, &self.base_url, token).await;
        }
        Ok(())
    }
}
