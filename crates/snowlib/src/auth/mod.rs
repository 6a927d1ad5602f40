//! Authentication for Snowflake connections
//!
//! Two methods are supported:
//! - Password: exchanged for a session token through the login endpoint
//! - Key pair (`authenticator = "SNOWFLAKE_JWT"`): RS256 JWT signed with a
//!   PKCS#8 private key, optionally encrypted
//!
//! Passphrases for encrypted keys are opt-in: an environment variable named
//! in the profile, or the OS keyring.

mod keypair;
mod login;
mod passphrase;

use std::fmt;
use std::path::PathBuf;

pub use keypair::{KeyPairAuth, account_identifier, resolve_key_path};
pub(crate) use login::{SessionToken, login, logout};
pub use passphrase::{OsKeyring, SecretStore, resolve_passphrase};

use crate::config::Profile;
use crate::{Error, Result};

/// Authenticator value selecting key-pair authentication
pub const KEYPAIR_AUTHENTICATOR: &str = "SNOWFLAKE_JWT";

/// Authenticator value selecting password authentication
pub const PASSWORD_AUTHENTICATOR: &str = "SNOWFLAKE";

/// String whose value never shows up in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Key file location and resolved passphrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairConfig {
    pub key_path: PathBuf,
    pub passphrase: Option<Secret>,
}

/// How a connection proves its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password(Secret),
    KeyPair(KeyPairConfig),
}

impl AuthMethod {
    #[must_use]
    pub const fn is_key_pair(&self) -> bool {
        matches!(self, Self::KeyPair(_))
    }
}

/// Pick the authentication method for a profile.
///
/// Key-pair processing runs eagerly so a bad key path or missing passphrase
/// fails at load time rather than at the first query.
pub fn resolve_auth(profile: &Profile, store: &dyn SecretStore) -> Result<AuthMethod> {
    let authenticator = profile
        .authenticator
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_uppercase);

    match authenticator.as_deref() {
        Some(KEYPAIR_AUTHENTICATOR) => {
            let key_path = resolve_key_path(profile.private_key_file.as_deref())?;
            let passphrase = resolve_passphrase(profile, store)?;
            tracing::debug!(
                key_path = %key_path.display(),
                has_passphrase = passphrase.is_some(),
                "Using key-pair authentication"
            );
            Ok(AuthMethod::KeyPair(KeyPairConfig {
                key_path,
                passphrase,
            }))
        }
        None | Some(PASSWORD_AUTHENTICATOR) => profile
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| AuthMethod::Password(Secret::new(p)))
            .ok_or_else(|| {
                Error::config(
                    "Password authentication requires 'password' in profile configuration",
                )
            }),
        Some(other) => Err(Error::NotSupported(format!(
            "Authenticator '{other}'. Use '{PASSWORD_AUTHENTICATOR}' or '{KEYPAIR_AUTHENTICATOR}'"
        ))),
    }
}

/// Credential attached to every API request
pub(crate) enum Credentials {
    KeyPair(KeyPairAuth),
    Session(SessionToken),
}

impl Credentials {
    /// `Authorization` header value and the token type header, if any
    pub(crate) fn authorization(&self) -> Result<(String, Option<&'static str>)> {
        match self {
            Self::KeyPair(auth) => Ok((format!("Bearer {}", auth.token()?), Some("KEYPAIR_JWT"))),
            Self::Session(token) => Ok((
                format!("Snowflake Token=\"{}\"", token.expose()),
                None,
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyPair(auth) => f.debug_tuple("KeyPair").field(auth).finish(),
            Self::Session(_) => f.write_str("Session(***)"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory secret store
    #[derive(Default)]
    pub(crate) struct StaticStore {
        entries: HashMap<(String, String), String>,
        failure: Option<String>,
    }

    impl StaticStore {
        pub(crate) fn empty() -> Self {
            Self::default()
        }

        pub(crate) fn with(service: &str, username: &str, password: &str) -> Self {
            let mut store = Self::default();
            store.entries.insert(
                (service.to_string(), username.to_string()),
                password.to_string(),
            );
            store
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::default()
            }
        }
    }

    impl SecretStore for StaticStore {
        fn get_password(
            &self,
            service: &str,
            username: &str,
        ) -> std::result::Result<Option<String>, String> {
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            Ok(self
                .entries
                .get(&(service.to_string(), username.to_string()))
                .cloned())
        }
    }

    pub(crate) fn fixture_path(name: &str) -> String {
        format!("{}/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "***");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_password_is_default() {
        let profile = Profile {
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        let auth = resolve_auth(&profile, &StaticStore::empty()).unwrap();
        assert_eq!(auth, AuthMethod::Password(Secret::new("hunter2")));
        assert!(!auth.is_key_pair());
    }

    #[test]
    fn test_explicit_password_authenticator_is_case_insensitive() {
        let profile = Profile {
            authenticator: Some("snowflake".into()),
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_auth(&profile, &StaticStore::empty()).unwrap(),
            AuthMethod::Password(_)
        ));
    }

    #[test]
    fn test_missing_password() {
        let err = resolve_auth(&Profile::default(), &StaticStore::empty()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'password'"));
    }

    #[test]
    fn test_keypair_selected_case_insensitively() {
        let profile = Profile {
            authenticator: Some("snowflake_jwt".into()),
            private_key_file: Some(fixture_path("rsa_key.p8")),
            ..Profile::default()
        };
        let auth = resolve_auth(&profile, &StaticStore::empty()).unwrap();
        match auth {
            AuthMethod::KeyPair(config) => {
                assert!(config.key_path.ends_with("rsa_key.p8"));
                assert!(config.passphrase.is_none());
            }
            AuthMethod::Password(_) => panic!("expected key-pair auth"),
        }
    }

    #[test]
    fn test_keypair_ignores_password() {
        let profile = Profile {
            authenticator: Some("SNOWFLAKE_JWT".into()),
            password: Some("unused".into()),
            ..Profile::default()
        };
        let err = resolve_auth(&profile, &StaticStore::empty()).unwrap_err();
        assert!(err.to_string().contains("requires 'private_key_file'"));
    }

    #[test]
    fn test_unknown_authenticator() {
        let profile = Profile {
            authenticator: Some("externalbrowser".into()),
            ..Profile::default()
        };
        let err = resolve_auth(&profile, &StaticStore::empty()).unwrap_err();
        assert!(err.is_not_supported());
        assert!(err.to_string().contains("EXTERNALBROWSER"));
    }
}
