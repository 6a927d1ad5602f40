//! Shared identity and lookup behaviour of Snowflake objects

use std::fmt;

use arrow_array::RecordBatch;
use async_trait::async_trait;

use super::database::Database;
use super::schema::Schema;
use super::show::{Show, ShowFilter};
use crate::constants::SHOW_NAME_COLUMN;
use crate::context::Context;
use crate::execute::{Executor, Row};
use crate::sql::{Fqn, is_valid_identifier};
use crate::{Error, Result};

/// Container an object is listed in: `IN <kind> <fqn>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: &'static str,
    pub fqn: Fqn,
}

impl Scope {
    #[must_use]
    pub const fn new(kind: &'static str, fqn: Fqn) -> Self {
        Self { kind, fqn }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.fqn)
    }
}

/// An object addressed by its fully qualified name.
///
/// Identity is immutable; state such as existence or metadata is queried
/// from Snowflake on every call.
#[async_trait]
pub trait SnowflakeObject: Send + Sync + Sized {
    /// Plural used in `SHOW <PLURAL>`
    const SHOW_PLURAL: &'static str;
    /// Column of `SHOW` output holding the object name
    const SHOW_NAME_COLUMN: &'static str = SHOW_NAME_COLUMN;
    /// Keyword used in `DESCRIBE` and `DROP`
    const OBJECT_TYPE: &'static str;

    fn context(&self) -> &Context;

    fn fqn(&self) -> &Fqn;

    /// Unqualified name
    fn name(&self) -> &str {
        self.fqn().name()
    }

    /// Container to search when listing this object, `None` at account level
    fn scope(&self) -> Option<Scope>;

    async fn exists(&self) -> Result<bool> {
        let scope = self.scope();
        Show::new(self.context().clone())
            .exists::<Self>(self.name(), scope.as_ref())
            .await
    }

    /// `SHOW` row for this object, `None` when it does not exist
    async fn metadata(&self) -> Result<Option<Row>> {
        let scope = self.scope();
        Show::new(self.context().clone())
            .get_metadata::<Self>(self.name(), scope.as_ref())
            .await
    }

    /// `DESCRIBE <TYPE> <fqn>` with lower-case column names
    async fn describe(&self) -> Result<RecordBatch> {
        let sql = format!("DESCRIBE {} {}", Self::OBJECT_TYPE, self.fqn());
        Executor::new(self.context().clone())
            .run_with_result_scan(&sql, &[])
            .await?
            .to_batch(true)
            .await
    }
}

/// Object living inside a schema: `DATABASE.SCHEMA.NAME`
#[async_trait]
pub trait SchemaChild: SnowflakeObject {
    /// Wrap an already validated three-part name
    fn from_fqn(fqn: Fqn, context: Context) -> Self;

    fn new(database: &str, schema: &str, name: &str, context: Context) -> Result<Self> {
        Ok(Self::from_fqn(
            Fqn::from_parts([database, schema, name])?,
            context,
        ))
    }

    /// Parse `db.schema.name`, `schema.name` or `name`.
    ///
    /// Missing parts come from the defaults, then from the session's current
    /// database and schema.
    async fn from_name(
        name: &str,
        context: &Context,
        default_database: Option<&str>,
        default_schema: Option<&str>,
    ) -> Result<Self> {
        let fqn = resolve_child_fqn(name, context, default_database, default_schema).await?;
        Ok(Self::from_fqn(fqn, context.clone()))
    }

    fn database(&self) -> Database {
        Database::from_fqn(self.fqn().truncated(1), self.context().clone())
    }

    fn schema(&self) -> Schema {
        Schema::from_fqn(self.fqn().truncated(2), self.context().clone())
    }
}

async fn default_or_current(
    default: Option<&str>,
    current: impl Future<Output = Result<String>>,
) -> Result<String> {
    match default.filter(|d| !d.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None => current.await,
    }
}

pub(crate) async fn resolve_child_fqn(
    name: &str,
    context: &Context,
    default_database: Option<&str>,
    default_schema: Option<&str>,
) -> Result<Fqn> {
    let parts: Vec<&str> = name.split('.').collect();
    match parts.as_slice() {
        [database, schema, object] => Fqn::from_parts([*database, *schema, *object]),
        [schema, object] => {
            let database = default_or_current(default_database, context.current_database()).await?;
            if database.is_empty() {
                return Err(Error::invalid_argument(format!(
                    "Cannot resolve '{name}': no database in context. \
                     Provide default_database or USE DATABASE first."
                )));
            }
            Fqn::from_parts([database.as_str(), schema, object])
        }
        [object] => {
            let database = default_or_current(default_database, context.current_database()).await?;
            let schema = default_or_current(default_schema, context.current_schema()).await?;
            if database.is_empty() || schema.is_empty() {
                return Err(Error::invalid_argument(format!(
                    "Cannot resolve '{name}': no database/schema in context. \
                     Provide defaults or USE DATABASE/SCHEMA first."
                )));
            }
            Fqn::from_parts([database.as_str(), schema.as_str(), object])
        }
        _ => Err(Error::invalid_argument(format!(
            "Invalid name: '{name}' (too many periods)"
        ))),
    }
}

/// Names of `T` objects inside `scope`, skipping quoted identifiers
pub(crate) async fn child_names<T: SnowflakeObject>(
    context: &Context,
    scope: &Scope,
) -> Result<Vec<String>> {
    let rows = Show::new(context.clone())
        .execute::<T>(Some(scope), &ShowFilter::default())
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| row.get(T::SHOW_NAME_COLUMN))
        .filter(|name| {
            let plain = is_valid_identifier(name);
            if !plain {
                tracing::warn!(
                    "Skipping {} with quoted identifier: '{name}'. \
                     Models layer only supports unquoted identifiers.",
                    T::OBJECT_TYPE.to_lowercase()
                );
            }
            plain
        })
        .map(str::to_string)
        .collect())
}

/// Equality, hashing and formatting by fully qualified name
macro_rules! object_identity {
    ($ty:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.fqn == other.fqn
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                stringify!($ty).hash(state);
                self.fqn.hash(state);
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.fqn, f)
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}('{}')", stringify!($ty), self.fqn)
            }
        }
    };
}

pub(crate) use object_identity;
