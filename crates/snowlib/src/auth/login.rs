//! Password login through the session endpoint

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{Secret, account_identifier};
use crate::config::ConnectionParams;
use crate::{Error, Result};

pub(crate) type SessionToken = Secret;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
}

fn login_url(base_url: &Url, params: &ConnectionParams) -> Result<Url> {
    let mut url = base_url
        .join("session/v1/login-request")
        .map_err(|e| Error::config(format!("Invalid login URL: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in [
            ("warehouse", &params.warehouse),
            ("databaseName", &params.database),
            ("schemaName", &params.schema),
            ("roleName", &params.role),
        ] {
            if let Some(value) = value {
                query.append_pair(key, value);
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// Exchange user and password for a session token
pub(crate) async fn login(
    client: &Client,
    base_url: &Url,
    params: &ConnectionParams,
    password: &Secret,
) -> Result<SessionToken> {
    let url = login_url(base_url, params)?;
    let body = json!({
        "data": {
            "ACCOUNT_NAME": account_identifier(&params.account),
            "LOGIN_NAME": params.user,
            "PASSWORD": password.expose(),
            "CLIENT_APP_ID": env!("CARGO_PKG_NAME"),
            "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
        }
    });

    tracing::debug!(user = %params.user, "Logging in with password");
    let response: LoginResponse = client
        .post(url)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if !response.success {
        return Err(Error::auth(
            response
                .message
                .unwrap_or_else(|| "Login rejected".to_string()),
        ));
    }

    response
        .data
        .and_then(|d| d.token)
        .map(Secret::new)
        .ok_or_else(|| Error::auth("Login response did not include a session token"))
}

/// End the session; failures are logged and ignored
pub(crate) async fn logout(client: &Client, base_url: &Url, token: &SessionToken) {
    let Ok(url) = base_url.join("session/logout-request") else {
        return;
    };
    let result = client
        .post(url)
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Snowflake Token=\"{}\"", token.expose()),
        )
        .send()
        .await;
    if let Err(e) = result {
        tracing::debug!(error = %e, "Logout request failed");
    }
}
