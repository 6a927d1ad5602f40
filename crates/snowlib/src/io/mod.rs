//! Table-level reads and writes of Arrow record batches
//!
//! Names given as `table`, `schema.table` or `database.schema.table` are
//! completed from the session's current database and schema.

mod schema;
mod write;

use std::fmt;
use std::str::FromStr;

use arrow_array::RecordBatch;

pub use schema::{
    ColumnSchema, detect_json_columns, get_table_schema, infer_snowflake_schema,
    prepare_json_columns, resolve_target_schema, schema_to_ddl,
};
pub use write::write;

use crate::context::Context;
use crate::execute::execute_sql;
use crate::sql::resolve_table_name;
use crate::{Error, Result};

/// What to do when the target table already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Keep the table and add rows; create it when missing
    Append,
    /// Drop the table and create it from the batch
    #[default]
    Replace,
    /// Refuse to write
    Fail,
}

impl WriteMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            "fail" => Ok(Self::Fail),
            _ => Err(Error::invalid_argument(format!(
                "Invalid mode '{mode}'. Must be 'append', 'replace', or 'fail'"
            ))),
        }
    }
}

/// How rows reach the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadMethod {
    /// Bound `INSERT ... SELECT ... FROM VALUES` statements
    #[default]
    Insert,
    /// Parquet file uploaded to a temporary stage, then `COPY INTO`
    Stage,
}

impl LoadMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Stage => "stage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub mode: WriteMode,
    pub uppercase_columns: bool,
    pub uppercase_table: bool,
    /// Columns created as VARIANT; `None` detects JSON-eligible columns
    pub variant_columns: Option<Vec<String>>,
    pub load_method: LoadMethod,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::default(),
            uppercase_columns: true,
            uppercase_table: true,
            variant_columns: None,
            load_method: LoadMethod::default(),
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub const fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn uppercase_columns(mut self, uppercase: bool) -> Self {
        self.uppercase_columns = uppercase;
        self
    }

    #[must_use]
    pub const fn uppercase_table(mut self, uppercase: bool) -> Self {
        self.uppercase_table = uppercase;
        self
    }

    #[must_use]
    pub fn variant_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variant_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn load_method(mut self, method: LoadMethod) -> Self {
        self.load_method = method;
        self
    }
}

/// Whole table as one batch
pub async fn read(table: &str, context: &Context, lowercase: bool) -> Result<RecordBatch> {
    let name = resolve_table_name(table, context).await?;
    query(&format!("SELECT * FROM {name}"), context, lowercase).await
}

/// Result of `sql` as one batch
pub async fn query(sql: &str, context: &Context, lowercase: bool) -> Result<RecordBatch> {
    execute_sql(sql, context).await?.to_batch(lowercase).await
}
