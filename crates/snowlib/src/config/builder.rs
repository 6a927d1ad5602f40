//! Runtime overrides and resolved connection parameters

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use url::Url;

use super::file::Profile;
use crate::auth::{AuthMethod, SecretStore, resolve_auth};
use crate::{Error, Result};

const DEFAULT_HOST_SUFFIX: &str = "snowflakecomputing.com";

macro_rules! string_setters {
    ($($field:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

/// Values that replace profile keys at runtime.
///
/// Every key set here wins over the value from `connections.toml`.
#[derive(Clone, Default, PartialEq)]
pub struct ConnectionOverrides {
    pub(crate) account: Option<String>,
    pub(crate) user: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) authenticator: Option<String>,
    pub(crate) warehouse: Option<String>,
    pub(crate) database: Option<String>,
    pub(crate) schema: Option<String>,
    pub(crate) role: Option<String>,
    pub(crate) private_key_file: Option<String>,
    pub(crate) private_key_passphrase_env: Option<String>,
    pub(crate) use_keyring: Option<bool>,
    pub(crate) keyring_service: Option<String>,
    pub(crate) keyring_username: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) session_parameters: BTreeMap<String, toml::Value>,
}

impl ConnectionOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    string_setters!(
        account,
        user,
        password,
        authenticator,
        warehouse,
        database,
        schema,
        role,
        private_key_file,
        private_key_passphrase_env,
        keyring_service,
        keyring_username,
        host,
    );

    #[must_use]
    pub const fn use_keyring(mut self, enabled: bool) -> Self {
        self.use_keyring = Some(enabled);
        self
    }

    #[must_use]
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn session_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<toml::Value>,
    ) -> Self {
        self.session_parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every set key into `profile`
    pub fn apply(self, profile: &mut Profile) {
        macro_rules! replace {
            ($($field:ident),*) => {
                $(
                    if self.$field.is_some() {
                        profile.$field = self.$field;
                    }
                )*
            };
        }

        replace!(
            account,
            user,
            password,
            authenticator,
            warehouse,
            database,
            schema,
            role,
            private_key_file,
            private_key_passphrase_env,
            use_keyring,
            keyring_service,
            keyring_username,
            host,
            timeout_secs
        );
        profile.session_parameters.extend(self.session_parameters);
    }
}

impl fmt::Debug for ConnectionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOverrides")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("authenticator", &self.authenticator)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("private_key_file", &self.private_key_file)
            .field("host", &self.host)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Fully resolved parameters needed to open a connection
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub account: String,
    pub user: String,
    pub auth: AuthMethod,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
    pub host: Option<String>,
    pub timeout: Option<Duration>,
    pub session_parameters: BTreeMap<String, serde_json::Value>,
}

impl ConnectionParams {
    /// Resolve a profile, reading key passphrases from the OS keyring when configured
    pub fn from_profile(profile: Profile) -> Result<Self> {
        Self::from_profile_with_store(profile, &crate::auth::OsKeyring)
    }

    /// Resolve a profile with an explicit secret store
    pub fn from_profile_with_store(profile: Profile, store: &dyn SecretStore) -> Result<Self> {
        let auth = resolve_auth(&profile, store)?;

        let account = required(profile.account, "account")?;
        let user = required(profile.user, "user")?;

        let session_parameters = profile
            .session_parameters
            .into_iter()
            .map(|(name, value)| Ok((name, serde_json::to_value(value)?)))
            .collect::<Result<_>>()?;

        Ok(Self {
            account,
            user,
            auth,
            warehouse: non_empty(profile.warehouse),
            database: non_empty(profile.database),
            schema: non_empty(profile.schema),
            role: non_empty(profile.role),
            host: non_empty(profile.host),
            timeout: profile.timeout_secs.map(Duration::from_secs),
            session_parameters,
        })
    }

    /// Host serving the account, `<account>.snowflakecomputing.com` by default
    #[must_use]
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| {
            format!(
                "{}.{DEFAULT_HOST_SUFFIX}",
                self.account.to_lowercase()
            )
        })
    }

    /// HTTPS base URL for API requests
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host();
        let raw = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        Url::parse(&raw).map_err(|e| Error::config(format!("Invalid host '{raw}': {e}")))
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    non_empty(value)
        .ok_or_else(|| Error::config(format!("Profile is missing required key '{key}'")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tests::StaticStore;

    fn password_profile() -> Profile {
        Profile {
            account: Some("XY12345.us-east-1".into()),
            user: Some("ANALYST".into()),
            password: Some("hunter2".into()),
            warehouse: Some("DEV_WH".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn test_overrides_replace_profile_keys() {
        let mut profile = password_profile();
        ConnectionOverrides::new()
            .warehouse("BIG_WH")
            .role("ADMIN")
            .timeout_secs(30)
            .session_parameter("QUERY_TAG", "etl")
            .apply(&mut profile);

        assert_eq!(profile.warehouse.as_deref(), Some("BIG_WH"));
        assert_eq!(profile.role.as_deref(), Some("ADMIN"));
        assert_eq!(profile.user.as_deref(), Some("ANALYST"));
        assert_eq!(profile.timeout_secs, Some(30));
        assert_eq!(
            profile.session_parameters.get("QUERY_TAG"),
            Some(&toml::Value::String("etl".into()))
        );
    }

    #[test]
    fn test_empty_overrides() {
        assert!(ConnectionOverrides::new().is_empty());
        assert!(!ConnectionOverrides::new().database("DB").is_empty());
    }

    #[test]
    fn test_overrides_debug_hides_password() {
        let overrides = ConnectionOverrides::new().password("hunter2");
        assert!(!format!("{overrides:?}").contains("hunter2"));
    }

    #[test]
    fn test_params_from_password_profile() {
        let params =
            ConnectionParams::from_profile_with_store(password_profile(), &StaticStore::empty())
                .unwrap();

        assert_eq!(params.account, "XY12345.us-east-1");
        assert!(matches!(params.auth, AuthMethod::Password(_)));
        assert_eq!(params.host(), "xy12345.us-east-1.snowflakecomputing.com");
        assert_eq!(
            params.base_url().unwrap().as_str(),
            "https://xy12345.us-east-1.snowflakecomputing.com/"
        );
    }

    #[test]
    fn test_missing_account_is_config_error() {
        let profile = Profile {
            account: None,
            ..password_profile()
        };
        let err =
            ConnectionParams::from_profile_with_store(profile, &StaticStore::empty()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'account'"));
    }

    #[test]
    fn test_host_override_accepts_scheme() {
        let profile = Profile {
            host: Some("http://localhost:8080".into()),
            ..password_profile()
        };
        let params =
            ConnectionParams::from_profile_with_store(profile, &StaticStore::empty()).unwrap();
        assert_eq!(params.base_url().unwrap().as_str(), "http://localhost:8080/");
    }
}
