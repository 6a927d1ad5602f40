//! `SHOW` statements and exact-name lookups

use super::object::{Scope, SnowflakeObject};
use crate::context::Context;
use crate::execute::{Executor, Row};
use crate::sql::{SafeQuery, is_valid_identifier, quote_literal};
use crate::{Error, Result};

/// Optional `LIKE`, `STARTS WITH` and `LIMIT` clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowFilter {
    pub like: Option<String>,
    pub starts_with: Option<String>,
    pub limit: Option<usize>,
}

impl ShowFilter {
    #[must_use]
    pub fn like(mut self, pattern: impl Into<String>) -> Self {
        self.like = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Build `SHOW <PLURAL> [LIKE '..'] [IN <KIND> <fqn>] [STARTS WITH '..'] [LIMIT n]`.
///
/// `SHOW` does not accept bind variables, so patterns are inlined as quoted
/// literals and the scope is a validated [`Fqn`](crate::sql::Fqn).
#[must_use]
pub fn show_sql(plural: &str, scope: Option<&Scope>, filter: &ShowFilter) -> String {
    let mut query = SafeQuery::new(format!("SHOW {plural}"));
    if let Some(like) = &filter.like {
        query = query.push(format!("LIKE {}", quote_literal(like)));
    }
    if let Some(scope) = scope {
        query = query.push(format!("IN {scope}"));
    }
    if let Some(prefix) = &filter.starts_with {
        query = query.push(format!("STARTS WITH {}", quote_literal(&prefix.to_uppercase())));
    }
    if let Some(limit) = filter.limit {
        query = query.push(format!("LIMIT {limit}"));
    }
    query.sql()
}

/// Runs `SHOW` commands for model types
#[derive(Debug, Clone)]
pub struct Show {
    context: Context,
}

impl Show {
    #[must_use]
    pub const fn new(context: Context) -> Self {
        Self { context }
    }

    /// Rows of `SHOW <T plural>`, read back through `RESULT_SCAN`
    pub async fn execute<T: SnowflakeObject>(
        &self,
        scope: Option<&Scope>,
        filter: &ShowFilter,
    ) -> Result<Vec<Row>> {
        let sql = show_sql(T::SHOW_PLURAL, scope, filter);
        Executor::new(self.context.clone())
            .run_with_result_scan(&sql, &[])
            .await?
            .fetch_all()
            .await
    }

    /// Row whose name matches `name` exactly, ignoring case
    pub async fn get_metadata<T: SnowflakeObject>(
        &self,
        name: &str,
        scope: Option<&Scope>,
    ) -> Result<Option<Row>> {
        if !is_valid_identifier(name) {
            return Err(Error::invalid_identifier(format!(
                "Invalid identifier name: '{name}'. The name must be a valid Snowflake identifier \
                 (letters, digits, underscores, starting with letter or underscore). \
                 Wildcards (%, _) are not allowed for exact matching."
            )));
        }

        let rows = self
            .execute::<T>(scope, &ShowFilter::default().like(name))
            .await?;
        Ok(rows.into_iter().find(|row| {
            row.get(T::SHOW_NAME_COLUMN)
                .is_some_and(|found| found.eq_ignore_ascii_case(name))
        }))
    }

    pub async fn exists<T: SnowflakeObject>(
        &self,
        name: &str,
        scope: Option<&Scope>,
    ) -> Result<bool> {
        Ok(self.get_metadata::<T>(name, scope).await?.is_some())
    }
}
