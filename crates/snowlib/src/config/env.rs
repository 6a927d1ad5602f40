//! Environment variable overrides for CLI use

use std::env;

use super::builder::ConnectionOverrides;

/// Environment variable names
mod vars {
    pub const SNOWLIB_WAREHOUSE: &str = "SNOWLIB_WAREHOUSE";
    pub const SNOWLIB_ROLE: &str = "SNOWLIB_ROLE";
    pub const SNOWLIB_DATABASE: &str = "SNOWLIB_DATABASE";
    pub const SNOWLIB_SCHEMA: &str = "SNOWLIB_SCHEMA";
    pub const SNOWLIB_USE_KEYRING: &str = "SNOWLIB_USE_KEYRING";
}

/// Fill overrides from the environment.
///
/// Keys already set on `overrides` are left alone, so explicit values win.
#[must_use]
pub fn load_from_env(mut overrides: ConnectionOverrides) -> ConnectionOverrides {
    let fill = |slot: &mut Option<String>, var: &str| {
        if slot.is_none()
            && let Ok(value) = env::var(var)
            && !value.is_empty()
        {
            *slot = Some(value);
        }
    };

    fill(&mut overrides.warehouse, vars::SNOWLIB_WAREHOUSE);
    fill(&mut overrides.role, vars::SNOWLIB_ROLE);
    fill(&mut overrides.database, vars::SNOWLIB_DATABASE);
    fill(&mut overrides.schema, vars::SNOWLIB_SCHEMA);

    if overrides.use_keyring.is_none()
        && let Ok(val) = env::var(vars::SNOWLIB_USE_KEYRING)
    {
        overrides.use_keyring = Some(parse_bool(&val));
    }

    overrides
}

pub(crate) fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
