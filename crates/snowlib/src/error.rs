use std::path::PathBuf;

use thiserror::Error;

/// Snowflake error code reported for a statement cancelled by the user.
pub const CANCELLED_ERROR_CODE: &str = "000604";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{profile}' not found in {file}. Available profiles: {available}")]
    ProfileNotFound {
        profile: String,
        file: String,
        available: String,
    },

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Private key file not found: {}", .0.display())]
    KeyFileNotFound(PathBuf),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Snowflake error {code} ({sql_state}): {message}")]
    Snowflake {
        code: String,
        sql_state: String,
        message: String,
        query_id: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    ObjectNotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Conversion error: {0}")]
    Conversion(#[from] snowlib_arrow::ArrowConversionError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    pub(crate) fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_profile_not_found(&self) -> bool {
        matches!(self, Self::ProfileNotFound { .. })
    }

    #[must_use]
    pub const fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_))
    }

    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    #[must_use]
    pub const fn is_key_file_not_found(&self) -> bool {
        matches!(self, Self::KeyFileNotFound(_))
    }

    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    #[must_use]
    pub const fn is_snowflake(&self) -> bool {
        matches!(self, Self::Snowflake { .. })
    }

    #[must_use]
    pub const fn is_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_))
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    #[must_use]
    pub const fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }

    #[must_use]
    pub const fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }

    #[must_use]
    pub const fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion(_) | Self::Arrow(_))
    }

    /// True for a statement error caused by cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Snowflake { code, .. } if code == CANCELLED_ERROR_CODE)
    }

    /// Snowflake error code, when the server reported one.
    #[must_use]
    pub fn snowflake_code(&self) -> Option<&str> {
        match self {
            Self::Snowflake { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn snowflake_error(code: &str) -> Error {
        Error::Snowflake {
            code: code.to_string(),
            sql_state: "42S02".to_string(),
            message: "Object does not exist".to_string(),
            query_id: None,
        }
    }

    #[test]
    fn test_config_predicate() {
        let err = Error::config("invalid config");
        assert!(err.is_config());
        assert!(!err.is_auth());
        assert_eq!(err.to_string(), "Configuration error: invalid config");
    }

    #[test]
    fn test_profile_not_found_display() {
        let err = Error::ProfileNotFound {
            profile: "prod".to_string(),
            file: "/tmp/connections.toml".to_string(),
            available: "dev, test".to_string(),
        };
        assert!(err.is_profile_not_found());
        assert_eq!(
            err.to_string(),
            "Profile 'prod' not found in /tmp/connections.toml. Available profiles: dev, test"
        );
    }

    #[test]
    fn test_key_file_not_found_display() {
        let err = Error::KeyFileNotFound(PathBuf::from("/keys/rsa.p8"));
        assert!(err.is_key_file_not_found());
        assert_eq!(err.to_string(), "Private key file not found: /keys/rsa.p8");
    }

    #[test]
    fn test_snowflake_predicates() {
        let err = snowflake_error("002003");
        assert!(err.is_snowflake());
        assert!(!err.is_cancelled());
        assert_eq!(err.snowflake_code(), Some("002003"));
        assert!(err.to_string().contains("42S02"));

        assert!(snowflake_error(CANCELLED_ERROR_CODE).is_cancelled());
    }

    #[test]
    fn test_identifier_messages_pass_through() {
        let err = Error::invalid_identifier("Identifier cannot be empty");
        assert!(err.is_invalid_identifier());
        assert_eq!(err.to_string(), "Identifier cannot be empty");
    }

    #[test]
    fn test_not_found_and_exists() {
        assert!(Error::ObjectNotFound("Table X".into()).is_not_found());
        assert!(Error::AlreadyExists("Table X already exists".into()).is_already_exists());
        assert!(Error::ConnectionClosed.is_connection_closed());
        assert!(Error::NotSupported("PUT".into()).is_not_supported());
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::other("disk full").into();
        assert!(err.to_string().contains("disk full"));
    }
}
