//! Queryable schema objects: tables, views, materialized views and dynamic tables

use arrow_array::RecordBatch;
use async_trait::async_trait;

use super::column::Column;
use super::object::{Scope, SchemaChild, SnowflakeObject, child_names, object_identity};
use super::show::Show;
use crate::context::Context;
use crate::execute::{Executor, execute_sql};
use crate::io::{WriteMode, WriteOptions, write};
use crate::sql::{Fqn, SafeQuery};
use crate::Result;

/// Behaviour shared by everything that can be selected from
#[async_trait]
pub trait TableLike: SchemaChild {
    /// Container keyword for `SHOW COLUMNS IN <kind>`
    const COLUMN_SCOPE: &'static str;

    /// `SELECT` the given columns (all when empty), lower-case column names
    async fn read(&self, columns: &[&str], limit: Option<usize>) -> Result<RecordBatch> {
        let query = if columns.is_empty() {
            SafeQuery::new("SELECT *")
        } else {
            let projection = vec!["IDENTIFIER(?)"; columns.len()].join(", ");
            SafeQuery::new("SELECT").when(true, projection, columns.iter().copied())
        };
        let query = query
            .push(format!("FROM {}", self.fqn()))
            .when(limit.is_some(), "LIMIT ?", limit);

        Executor::new(self.context().clone())
            .run_query(&query)
            .await?
            .to_batch(true)
            .await
    }

    async fn drop(&self, if_exists: bool) -> Result<()> {
        let guard = if if_exists { " IF EXISTS" } else { "" };
        let sql = format!("DROP {}{guard} {}", Self::OBJECT_TYPE, self.fqn());
        execute_sql(&sql, self.context()).await?;
        Ok(())
    }

    async fn columns(&self) -> Result<Vec<Column>> {
        let scope = Scope::new(Self::COLUMN_SCOPE, self.fqn().clone());
        Ok(child_names::<Column>(self.context(), &scope)
            .await?
            .iter()
            .filter_map(|name| self.fqn().child(name).ok())
            .map(|fqn| Column::from_fqn(fqn, Self::COLUMN_SCOPE, self.context().clone()))
            .collect())
    }

    /// Column handle; existence is not checked
    fn column(&self, name: &str) -> Result<Column> {
        Ok(Column::from_fqn(
            self.fqn().child(name)?,
            Self::COLUMN_SCOPE,
            self.context().clone(),
        ))
    }

    async fn has_column(&self, name: &str) -> Result<bool> {
        let scope = Scope::new(Self::COLUMN_SCOPE, self.fqn().clone());
        Show::new(self.context().clone())
            .exists::<Column>(name, Some(&scope))
            .await
    }
}

macro_rules! table_like {
    ($(#[$meta:meta])* $ty:ident, $plural:literal, $object:literal, $column_scope:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $ty {
            fqn: Fqn,
            context: Context,
        }

        object_identity!($ty);

        #[async_trait]
        impl SnowflakeObject for $ty {
            const SHOW_PLURAL: &'static str = $plural;
            const OBJECT_TYPE: &'static str = $object;

            fn context(&self) -> &Context {
                &self.context
            }

            fn fqn(&self) -> &Fqn {
                &self.fqn
            }

            fn scope(&self) -> Option<Scope> {
                Some(Scope::new("SCHEMA", self.fqn.truncated(2)))
            }
        }

        impl SchemaChild for $ty {
            fn from_fqn(fqn: Fqn, context: Context) -> Self {
                Self { fqn, context }
            }
        }

        impl TableLike for $ty {
            const COLUMN_SCOPE: &'static str = $column_scope;
        }
    };
}

table_like!(
    /// Table with read and write access
    Table, "TABLES", "TABLE", "TABLE"
);
table_like!(View, "VIEWS", "VIEW", "VIEW");
table_like!(
    /// View whose results Snowflake keeps cached
    MaterializedView, "MATERIALIZED VIEWS", "MATERIALIZED VIEW", "VIEW"
);
table_like!(
    /// Table refreshed from its defining query on a target lag
    DynamicTable, "DYNAMIC TABLES", "DYNAMIC TABLE", "TABLE"
);

/// `text` column of the `SHOW` row
async fn definition_of<T: SnowflakeObject>(object: &T) -> Result<Option<String>> {
    Ok(object
        .metadata()
        .await?
        .and_then(|row| row.get("text").map(str::to_string)))
}

impl Table {
    /// Write `batch` with upper-cased column names. Returns the rows written.
    pub async fn write(&self, batch: &RecordBatch, mode: WriteMode) -> Result<usize> {
        let options = WriteOptions::default().mode(mode);
        write(batch, &self.fqn.to_string(), &self.context, &options).await
    }

    pub async fn insert(&self, batch: &RecordBatch) -> Result<usize> {
        self.write(batch, WriteMode::Append).await
    }

    /// Remove every row, keeping the table
    pub async fn truncate(&self) -> Result<()> {
        execute_sql(&format!("TRUNCATE TABLE {}", self.fqn), &self.context).await?;
        Ok(())
    }
}

impl View {
    /// Defining `SELECT`, `None` when the view does not exist
    pub async fn definition(&self) -> Result<Option<String>> {
        definition_of(self).await
    }
}

impl MaterializedView {
    pub async fn definition(&self) -> Result<Option<String>> {
        definition_of(self).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.alter("REFRESH").await
    }

    async fn alter(&self, action: &str) -> Result<()> {
        let sql = format!("ALTER {} {} {action}", Self::OBJECT_TYPE, self.fqn);
        execute_sql(&sql, &self.context).await?;
        Ok(())
    }
}

impl DynamicTable {
    pub async fn definition(&self) -> Result<Option<String>> {
        definition_of(self).await
    }

    /// Stop automatic refreshes
    pub async fn suspend(&self) -> Result<()> {
        self.alter("SUSPEND").await
    }

    pub async fn resume(&self) -> Result<()> {
        self.alter("RESUME").await
    }

    /// Refresh now, regardless of target lag
    pub async fn refresh(&self) -> Result<()> {
        self.alter("REFRESH").await
    }

    async fn alter(&self, action: &str) -> Result<()> {
        let sql = format!("ALTER {} {} {action}", Self::OBJECT_TYPE, self.fqn);
        execute_sql(&sql, &self.context).await?;
        Ok(())
    }
}
