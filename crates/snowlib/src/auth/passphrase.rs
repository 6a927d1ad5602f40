//! Passphrase sources for encrypted private keys

use std::env;

use super::Secret;
use crate::config::Profile;
use crate::{Error, Result};

/// Read access to a password store keyed by service and username.
///
/// `Ok(None)` means the store works but holds no entry.
pub trait SecretStore {
    fn get_password(
        &self,
        service: &str,
        username: &str,
    ) -> std::result::Result<Option<String>, String>;
}

/// The platform credential store (Keychain, Credential Manager, Secret Service)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeyring;

#[cfg(feature = "keyring")]
impl SecretStore for OsKeyring {
    fn get_password(
        &self,
        service: &str,
        username: &str,
    ) -> std::result::Result<Option<String>, String> {
        let entry = keyring::Entry::new(service, username).map_err(|e| e.to_string())?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(not(feature = "keyring"))]
impl SecretStore for OsKeyring {
    fn get_password(
        &self,
        _service: &str,
        _username: &str,
    ) -> std::result::Result<Option<String>, String> {
        Err("snowlib was built without the 'keyring' feature".to_string())
    }
}

/// Passphrase for the profile's private key.
///
/// Sources are opt-in and checked in order: the environment variable named
/// by `private_key_passphrase_env`, then the keyring when `use_keyring` or
/// a keyring key is set. No source configured means an unencrypted key.
pub fn resolve_passphrase(profile: &Profile, store: &dyn SecretStore) -> Result<Option<Secret>> {
    if let Some(var) = profile
        .private_key_passphrase_env
        .as_deref()
        .filter(|v| !v.is_empty())
    {
        return match env::var(var) {
            Ok(value) if !value.is_empty() => Ok(Some(Secret::new(value))),
            _ => Err(Error::config(format!(
                "Environment variable '{var}' specified in 'private_key_passphrase_env' \
                 but not found in environment"
            ))),
        };
    }

    let keyring_requested = profile.use_keyring.unwrap_or(false)
        || profile.keyring_service.is_some()
        || profile.keyring_username.is_some();
    if !keyring_requested {
        return Ok(None);
    }

    let service = profile.keyring_service.as_deref().ok_or_else(|| {
        Error::config(
            "Keyring enabled but 'keyring_service' not specified in config. \
             Example: keyring_service = 'snowflake'",
        )
    })?;
    let username = profile.keyring_username.as_deref().ok_or_else(|| {
        Error::config(
            "Keyring enabled but 'keyring_username' not specified in config. \
             Example: keyring_username = 'myuser_keypair'",
        )
    })?;

    match store.get_password(service, username) {
        Ok(Some(password)) => {
            tracing::debug!(service, username, "Loaded key passphrase from keyring");
            Ok(Some(Secret::new(password)))
        }
        Ok(None) => Err(Error::auth(format!(
            "Keyring configured but no password found for service='{service}', \
             username='{username}'"
        ))),
        Err(e) => Err(Error::auth(format!(
            "Failed to retrieve passphrase from keyring (service='{service}', \
             username='{username}'): {e}"
        ))),
    }
}
