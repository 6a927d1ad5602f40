//! Fully qualified object names

use std::fmt;
use std::str::FromStr;

use super::identifier::is_valid_identifier;
use crate::{Error, Result};

/// Dot-separated name of unquoted identifiers, stored upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fqn {
    parts: Vec<String>,
}

impl Fqn {
    /// Validate and upper-case each part
    pub fn from_parts<I, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts = parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let part = part.as_ref();
                if is_valid_identifier(part) {
                    Ok(part.to_uppercase())
                } else {
                    Err(Error::invalid_identifier(format!(
                        "Invalid identifier at position {i}: '{part}'. Only unquoted Snowflake \
                         identifiers are supported (letters, digits, underscores; must start \
                         with letter or underscore)."
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        if parts.is_empty() {
            return Err(Error::invalid_identifier("FQN must have at least one part"));
        }
        Ok(Self { parts })
    }

    /// Split on `.` and validate
    pub fn parse(qualified_name: &str) -> Result<Self> {
        if qualified_name.is_empty() {
            return Err(Error::invalid_identifier("Cannot parse empty string"));
        }
        Self::from_parts(qualified_name.split('.'))
    }

    /// Extend with one more part
    pub fn child(&self, name: &str) -> Result<Self> {
        Self::from_parts(self.parts.iter().map(String::as_str).chain([name]))
    }

    /// Drop the last part; `None` for single-part names
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.parts.len() > 1).then(|| Self {
            parts: self.parts[..self.parts.len() - 1].to_vec(),
        })
    }

    /// First `len` parts; the whole name when it is shorter
    #[must_use]
    pub(crate) fn truncated(&self, len: usize) -> Self {
        Self {
            parts: self.parts[..len.min(self.parts.len())].to_vec(),
        }
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.parts.get(1).map(String::as_str)
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.parts.get(2).map(String::as_str)
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.parts.get(3).map(String::as_str)
    }

    /// Last part
    #[must_use]
    pub fn name(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

impl FromStr for Fqn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
