//! TOML profile file loading

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::paths::resolve_config_path;
use crate::{Error, Result};

/// One named table of `connections.toml`
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub authenticator: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
    pub private_key_file: Option<String>,
    pub private_key_passphrase_env: Option<String>,
    pub use_keyring: Option<bool>,
    pub keyring_service: Option<String>,
    pub keyring_username: Option<String>,
    /// Host override; defaults to `<account>.snowflakecomputing.com`
    pub host: Option<String>,
    /// Statement timeout sent with every request
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub session_parameters: BTreeMap<String, toml::Value>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("authenticator", &self.authenticator)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("private_key_file", &self.private_key_file)
            .field("private_key_passphrase_env", &self.private_key_passphrase_env)
            .field("use_keyring", &self.use_keyring)
            .field("keyring_service", &self.keyring_service)
            .field("keyring_username", &self.keyring_username)
            .field("host", &self.host)
            .field("timeout_secs", &self.timeout_secs)
            .field("session_parameters", &self.session_parameters)
            .finish()
    }
}

fn read_profiles(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Load a named profile from `connections.toml`
pub fn load_profile(profile: &str, path: Option<&Path>) -> Result<Profile> {
    let config_file = resolve_config_path(path)?;

    if !config_file.exists() {
        return Err(Error::config(format!(
            "Snowflake configuration file not found at {}. \
             Create a connections.toml file with one table per profile.",
            config_file.display()
        )));
    }

    let mut all_profiles = read_profiles(&config_file)?;
    let Some(value) = all_profiles.remove(profile) else {
        let available: Vec<&str> = all_profiles.keys().map(String::as_str).collect();
        return Err(Error::ProfileNotFound {
            profile: profile.to_string(),
            file: config_file.display().to_string(),
            available: available.join(", "),
        });
    };

    tracing::debug!(profile, file = %config_file.display(), "Loaded connection profile");

    value.try_into::<Profile>().map_err(|e| {
        Error::config(format!(
            "Invalid profile '{profile}' in {}: {e}",
            config_file.display()
        ))
    })
}

/// Profile names in file order; empty when no file exists
pub fn list_profiles(path: Option<&Path>) -> Result<Vec<String>> {
    let Ok(config_file) = resolve_config_path(path) else {
        return Ok(Vec::new());
    };

    if !config_file.exists() {
        return Ok(Vec::new());
    }

    Ok(read_profiles(&config_file)?.keys().cloned().collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const SAMPLE: &str = r#"
[dev]
account = "xy12345.us-east-1"
user = "DEV_USER"
password = "hunter2"
warehouse = "DEV_WH"
database = "ANALYTICS"
schema = "PUBLIC"

[prod]
account = "xy12345"
user = "SVC"
authenticator = "SNOWFLAKE_JWT"
private_key_file = "~/.snowflake/rsa_key.p8"
private_key_passphrase_env = "SNOWFLAKE_KEY_PASS"
timeout_secs = 600

[prod.session_parameters]
QUERY_TAG = "snowlib"
"#;

    #[test]
    fn test_load_profile_success() {
        let file = create_temp_config(SAMPLE);
        let profile = load_profile("dev", Some(file.path())).unwrap();

        assert_eq!(profile.account.as_deref(), Some("xy12345.us-east-1"));
        assert_eq!(profile.warehouse.as_deref(), Some("DEV_WH"));
        assert_eq!(profile.password.as_deref(), Some("hunter2"));
        assert!(profile.session_parameters.is_empty());
    }

    #[test]
    fn test_load_profile_with_session_parameters() {
        let file = create_temp_config(SAMPLE);
        let profile = load_profile("prod", Some(file.path())).unwrap();

        assert_eq!(profile.timeout_secs, Some(600));
        assert_eq!(
            profile.session_parameters.get("QUERY_TAG"),
            Some(&toml::Value::String("snowlib".into()))
        );
    }

    #[test]
    fn test_missing_profile_lists_available() {
        let file = create_temp_config(SAMPLE);
        let err = load_profile("staging", Some(file.path())).unwrap_err();

        assert!(err.is_profile_not_found());
        let msg = err.to_string();
        assert!(msg.contains("Profile 'staging' not found"));
        assert!(msg.contains("Available profiles: dev, prod"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_profile("dev", Some(Path::new("/nonexistent/connections.toml")))
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_toml() {
        let file = create_temp_config("this is not valid toml {{{{");
        let err = load_profile("dev", Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_list_profiles_in_file_order() {
        let file = create_temp_config(SAMPLE);
        assert_eq!(list_profiles(Some(file.path())).unwrap(), vec!["dev", "prod"]);
    }

    #[test]
    fn test_list_profiles_missing_file_is_empty() {
        let profiles = list_profiles(Some(Path::new("/nonexistent/connections.toml"))).unwrap();
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_debug_hides_password() {
        let file = create_temp_config(SAMPLE);
        let profile = load_profile("dev", Some(file.path())).unwrap();
        let debug = format!("{profile:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
