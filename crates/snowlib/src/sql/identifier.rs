//! Unquoted identifier rules and literal quoting

use crate::constants::MAX_IDENTIFIER_LENGTH;
use crate::{Error, Result};

/// Check for a plain unquoted identifier: `[A-Za-z_][A-Za-z0-9_]*`
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate identifier and return error if invalid
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_identifier("Identifier cannot be empty"));
    }
    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::invalid_identifier(format!(
            "Identifier too long (max {MAX_IDENTIFIER_LENGTH} chars): '{name}'"
        )));
    }
    if !is_valid_identifier(name) {
        return Err(Error::invalid_identifier(format!(
            "Invalid identifier '{name}': must start with letter or underscore, \
             contain only letters, numbers, and underscores"
        )));
    }
    Ok(())
}

/// Single-quoted SQL string literal with embedded quotes and backslashes escaped
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
