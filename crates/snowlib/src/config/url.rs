//! `snowflake://` connection URLs for tools that take one

use url::Url;

use super::file::Profile;
use crate::{Error, Result};

/// Build `snowflake://user@account[/database[/schema]]` from a profile.
///
/// `warehouse` and `role` become query parameters. Secrets are never
/// embedded.
pub fn connection_url(profile: &Profile) -> Result<Url> {
    let account = profile
        .account
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| Error::config("Profile is missing required key 'account'"))?;
    let user = profile
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::config("Profile is missing required key 'user'"))?;

    let mut url = Url::parse(&format!("snowflake://{account}"))
        .map_err(|e| Error::config(format!("Invalid account '{account}': {e}")))?;
    url.set_username(user)
        .map_err(|()| Error::config("Failed to set username in URL"))?;

    let database = profile.database.as_deref().filter(|d| !d.is_empty());
    let schema = profile.schema.as_deref().filter(|s| !s.is_empty());
    if let Some(database) = database {
        let path = match schema {
            Some(schema) => format!("/{database}/{schema}"),
            None => format!("/{database}"),
        };
        url.set_path(&path);
    }

    {
        let mut query = url.query_pairs_mut();
        for (key, value) in [("warehouse", &profile.warehouse), ("role", &profile.role)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.append_pair(key, value);
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
