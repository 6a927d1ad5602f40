//! SQL assembly with positional bindings

use crate::driver::{BindValue, Statement};

/// Builds SQL from optional clauses while keeping values in bindings
///
/// # Example
///
/// ```rust,ignore
/// let query = SafeQuery::new("SELECT * FROM T")
///     .when(limit.is_some(), "LIMIT ?", [BindValue::from(limit)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafeQuery {
    parts: Vec<String>,
    bindings: Vec<BindValue>,
}

impl SafeQuery {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            parts: vec![base.into()],
            bindings: Vec::new(),
        }
    }

    /// Append `template` and its values when `condition` holds
    #[must_use]
    pub fn when<I>(mut self, condition: bool, template: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BindValue>,
    {
        if condition {
            self.parts.push(template.into());
            self.bindings.extend(values.into_iter().map(Into::into));
        }
        self
    }

    /// Append a clause without bindings
    #[must_use]
    pub fn push(mut self, clause: impl Into<String>) -> Self {
        self.parts.push(clause.into());
        self
    }

    /// Clauses joined with single spaces
    #[must_use]
    pub fn sql(&self) -> String {
        self.parts.join(" ")
    }

    #[must_use]
    pub fn bindings(&self) -> &[BindValue] {
        &self.bindings
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<BindValue>) {
        (self.sql(), self.bindings)
    }

    #[must_use]
    pub fn to_statement(&self) -> Statement {
        Statement::new(self.sql()).with_bindings(self.bindings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clauses_join_with_spaces() {
        let query = SafeQuery::new("SELECT *")
            .push("FROM T")
            .when(true, "WHERE A = ?", ["x"])
            .when(false, "AND B = ?", ["y"])
            .when(true, "LIMIT ?", [10_i64]);

        assert_eq!(query.sql(), "SELECT * FROM T WHERE A = ? LIMIT ?");
        assert_eq!(
            query.bindings(),
            &[BindValue::Text("x".into()), BindValue::Fixed(10)]
        );
    }

    #[test]
    fn test_into_parts() {
        let (sql, bindings) = SafeQuery::new("SELECT 1").into_parts();
        assert_eq!(sql, "SELECT 1");
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_false_condition_skips_values() {
        let query = SafeQuery::new("SHOW TABLES").when(false, "LIMIT ?", [5_i64]);
        assert!(query.bindings().is_empty());
        assert_eq!(query.to_statement().sql, "SHOW TABLES");
    }
}
