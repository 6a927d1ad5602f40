//! Connection profiles
//!
//! Resolution order: runtime overrides > profile in `connections.toml`.
//! The CLI additionally fills unset keys from `SNOWLIB_*` variables.

mod builder;
mod env;
mod file;
pub(crate) mod paths;
mod url;

pub use builder::{ConnectionOverrides, ConnectionParams};
pub use env::load_from_env;
pub use file::{Profile, list_profiles, load_profile};
pub use paths::{
    CONFIG_DIR_ENV, CONFIG_FILE_NAME, config_directory, default_config_path, resolve_config_path,
};
pub use self::url::connection_url;

use std::path::Path;

use crate::Result;

/// Load a profile, apply overrides, and resolve authentication
pub fn load_params(
    profile: &str,
    path: Option<&Path>,
    overrides: ConnectionOverrides,
) -> Result<ConnectionParams> {
    let mut loaded = load_profile(profile, path)?;
    if !overrides.is_empty() {
        tracing::debug!(profile, ?overrides, "Applying connection overrides");
        overrides.apply(&mut loaded);
    }
    ConnectionParams::from_profile(loaded)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_params_applies_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[dev]\naccount = \"xy12345\"\nuser = \"analyst\"\npassword = \"pw\"\nwarehouse = \"WH\"\n",
        )
        .unwrap();

        let params = load_params(
            "dev",
            Some(file.path()),
            ConnectionOverrides::new().warehouse("BIG_WH"),
        )
        .unwrap();

        assert_eq!(params.warehouse.as_deref(), Some("BIG_WH"));
        assert_eq!(params.user, "analyst");
    }

    #[test]
    fn test_load_params_missing_profile() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[dev]\naccount = \"a\"\n").unwrap();

        let err = load_params("prod", Some(file.path()), ConnectionOverrides::new()).unwrap_err();
        assert!(err.is_profile_not_found());
    }
}
