//! Table name parsing and resolution against the session context

use std::fmt;

use super::identifier::validate_identifier;
use crate::context::Context;
use crate::{Error, Result};

/// `database.schema.table` split into its parts, case preserved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableName {
    /// Upper-cased `DATABASE.SCHEMA.TABLE`
    #[must_use]
    pub fn qualified(&self) -> String {
        format_qualified_name(&self.database, &self.schema, &self.table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

fn missing_schema(name: &str) -> Error {
    Error::invalid_argument(format!(
        "Schema required for table '{name}'. \
         Provide as 'schema.table' or pass default_schema parameter"
    ))
}

fn missing_database(name: &str) -> Error {
    Error::invalid_argument(format!(
        "Database required for table '{name}'. \
         Provide as 'database.schema.table' or pass default_database parameter"
    ))
}

/// Split `table`, `schema.table` or `database.schema.table`, filling gaps from defaults
pub fn parse_table_name(
    name: &str,
    default_schema: Option<&str>,
    default_database: Option<&str>,
) -> Result<TableName> {
    if name.is_empty() {
        return Err(Error::invalid_argument("Table name cannot be empty"));
    }

    let default_schema = default_schema.filter(|s| !s.is_empty());
    let default_database = default_database.filter(|d| !d.is_empty());
    let parts: Vec<&str> = name.split('.').collect();

    let (database, schema, table) = match parts.as_slice() {
        [table] => {
            validate_identifier(table)?;
            let schema = default_schema.ok_or_else(|| missing_schema(name))?;
            let database = default_database.ok_or_else(|| missing_database(name))?;
            validate_identifier(schema)?;
            validate_identifier(database)?;
            (database, schema, *table)
        }
        [schema, table] => {
            validate_identifier(schema)?;
            validate_identifier(table)?;
            let database = default_database.ok_or_else(|| missing_database(name))?;
            validate_identifier(database)?;
            (database, *schema, *table)
        }
        [database, schema, table] => {
            validate_identifier(database)?;
            validate_identifier(schema)?;
            validate_identifier(table)?;
            (*database, *schema, *table)
        }
        _ => {
            return Err(Error::invalid_argument(format!(
                "Invalid table name '{name}'. \
                 Expected format: 'table', 'schema.table', or 'database.schema.table'"
            )));
        }
    };

    Ok(TableName {
        database: database.to_string(),
        schema: schema.to_string(),
        table: table.to_string(),
    })
}

/// Like [`parse_table_name`], taking missing parts from the current session
pub async fn resolve_table_name(name: &str, context: &Context) -> Result<TableName> {
    if name.is_empty() {
        return Err(Error::invalid_argument("Table name cannot be empty"));
    }

    let depth = name.split('.').count();
    if depth >= 3 {
        return parse_table_name(name, None, None);
    }

    let database = context.current_database().await?;
    if database.is_empty() {
        return Err(Error::invalid_argument(format!(
            "Cannot resolve database for '{name}'. Connection has no current database. \
             Provide fully qualified name or set database in connection."
        )));
    }

    let schema = if depth == 1 {
        let schema = context.current_schema().await?;
        if schema.is_empty() {
            return Err(Error::invalid_argument(format!(
                "Cannot resolve schema for '{name}'. Connection has no current schema. \
                 Provide qualified name or set schema in connection."
            )));
        }
        Some(schema)
    } else {
        None
    };

    parse_table_name(name, schema.as_deref(), Some(&database))
}

/// `DATABASE.SCHEMA.TABLE`, upper-cased
#[must_use]
pub fn format_qualified_name(database: &str, schema: &str, table: &str) -> String {
    format!(
        "{}.{}.{}",
        database.to_uppercase(),
        schema.to_uppercase(),
        table.to_uppercase()
    )
}
