//! Location of `connections.toml`

use std::env;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SNOWLIB_CONFIG_DIR";

/// Profile file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "connections.toml";

const DOTFILE_DIR: &str = ".snowlib";

/// Home directory from `HOME`, falling back to `USERPROFILE` on Windows
pub(crate) fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };

    match (rest, home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Configuration directory: `SNOWLIB_CONFIG_DIR`, else `~/.snowlib`.
///
/// The dotfile directory is created when missing.
pub fn config_directory() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let home = home_dir()
        .ok_or_else(|| Error::config("Cannot determine home directory for ~/.snowlib"))?;
    let dir = home.join(DOTFILE_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default `connections.toml` path; errors with setup instructions when absent
pub fn default_config_path() -> Result<PathBuf> {
    let path = config_directory()?.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Err(Error::config(format!(
            "Configuration file '{CONFIG_FILE_NAME}' not found at: {path}\n\n\
             To create it:\n\
             1. Create {path}\n\
             2. Add one [profile] table per connection\n\
             3. Edit with your connection details\n\n\
             Configuration directory priority:\n  \
             1. {CONFIG_DIR_ENV} environment variable (if set)\n  \
             2. ~/.snowlib/ (dotfile directory)\n",
            path = path.display()
        )));
    }
    Ok(path)
}

/// Explicit path when given, otherwise the default location
pub fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    /// Serializes every test in the crate that touches process environment
    pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_env_override_directory() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[dev]\n").unwrap();

        // SAFETY: We hold ENV_MUTEX so no other test touches the environment
        unsafe { env::set_var(CONFIG_DIR_ENV, dir.path()) };
        let path = resolve_config_path(None);
        // SAFETY: Same lock as above
        unsafe { env::remove_var(CONFIG_DIR_ENV) };

        assert_eq!(path.unwrap(), dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_missing_default_file_explains_locations() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = TempDir::new().unwrap();

        // SAFETY: We hold ENV_MUTEX so no other test touches the environment
        unsafe { env::set_var(CONFIG_DIR_ENV, dir.path()) };
        let err = default_config_path().unwrap_err();
        // SAFETY: Same lock as above
        unsafe { env::remove_var(CONFIG_DIR_ENV) };

        let msg = err.to_string();
        assert!(err.is_config());
        assert!(msg.contains(CONFIG_DIR_ENV));
        assert!(msg.contains("~/.snowlib/"));
    }

    #[test]
    fn test_expand_home() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let old = env::var_os("HOME");

        // SAFETY: We hold ENV_MUTEX so no other test touches the environment
        unsafe { env::set_var("HOME", "/home/tester") };
        assert_eq!(
            expand_home("~/.snowflake/key.p8"),
            PathBuf::from("/home/tester/.snowflake/key.p8")
        );
        assert_eq!(expand_home("~"), PathBuf::from("/home/tester"));
        assert_eq!(expand_home("/abs/key.p8"), PathBuf::from("/abs/key.p8"));
        assert_eq!(expand_home("keys/key.p8"), PathBuf::from("keys/key.p8"));

        // SAFETY: Same lock as above
        unsafe {
            match old {
                Some(home) => env::set_var("HOME", home),
                None => env::remove_var("HOME"),
            }
        }
    }
}
