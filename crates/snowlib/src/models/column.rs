use arrow::compute::filter_record_batch;
use arrow_array::cast::AsArray;
use arrow_array::{BooleanArray, RecordBatch};
use async_trait::async_trait;

use super::database::Database;
use super::object::{Scope, SchemaChild, SnowflakeObject, object_identity};
use super::schema::Schema;
use super::table::Table;
use crate::context::Context;
use crate::execute::Executor;
use crate::sql::Fqn;
use crate::Result;

/// Column of a table or view: `DATABASE.SCHEMA.TABLE.COLUMN`
#[derive(Clone)]
pub struct Column {
    fqn: Fqn,
    parent_kind: &'static str,
    context: Context,
}

object_identity!(Column);

impl Column {
    /// Column of the table `database.schema.table`
    pub fn new(
        database: &str,
        schema: &str,
        table: &str,
        name: &str,
        context: Context,
    ) -> Result<Self> {
        Ok(Self::from_fqn(
            Fqn::from_parts([database, schema, table, name])?,
            "TABLE",
            context,
        ))
    }

    pub(crate) const fn from_fqn(fqn: Fqn, parent_kind: &'static str, context: Context) -> Self {
        Self {
            fqn,
            parent_kind,
            context,
        }
    }

    #[must_use]
    pub fn table(&self) -> Table {
        Table::from_fqn(self.fqn.truncated(3), self.context.clone())
    }

    #[must_use]
    pub fn schema(&self) -> Schema {
        Schema::from_fqn(self.fqn.truncated(2), self.context.clone())
    }

    #[must_use]
    pub fn database(&self) -> Database {
        Database::from_fqn(self.fqn.truncated(1), self.context.clone())
    }
}

#[async_trait]
impl SnowflakeObject for Column {
    const SHOW_PLURAL: &'static str = "COLUMNS";
    const SHOW_NAME_COLUMN: &'static str = "column_name";
    const OBJECT_TYPE: &'static str = "COLUMN";

    fn context(&self) -> &Context {
        &self.context
    }

    fn fqn(&self) -> &Fqn {
        &self.fqn
    }

    fn scope(&self) -> Option<Scope> {
        Some(Scope::new(self.parent_kind, self.fqn.truncated(3)))
    }

    /// Row of the parent's `DESCRIBE` output for this column
    async fn describe(&self) -> Result<RecordBatch> {
        let sql = format!("DESCRIBE {} {}", self.parent_kind, self.fqn.truncated(3));
        let batch = Executor::new(self.context.clone())
            .run_with_result_scan(&sql, &[])
            .await?
            .to_batch(true)
            .await?;

        let name = self.name();
        let mask: BooleanArray = match batch.column_by_name("name") {
            Some(names) => names
                .as_string_opt::<i32>()
                .map(|names| {
                    names
                        .iter()
                        .map(|found| Some(found.is_some_and(|n| n.eq_ignore_ascii_case(name))))
                        .collect()
                })
                .unwrap_or_else(|| BooleanArray::from(vec![false; batch.num_rows()])),
            None => BooleanArray::from(vec![false; batch.num_rows()]),
        };
        Ok(filter_record_batch(&batch, &mask)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::StringArray;

    use super::*;
    use crate::driver::mock::MockDriver;

    #[test]
    fn test_parent_navigation() {
        let context = Context::with_driver(Arc::new(MockDriver::new()));
        let column = Column::new("db", "public", "orders", "amount", context).unwrap();

        assert_eq!(column.to_string(), "DB.PUBLIC.ORDERS.AMOUNT");
        assert_eq!(column.name(), "AMOUNT");
        assert_eq!(column.table().to_string(), "DB.PUBLIC.ORDERS");
        assert_eq!(column.schema().to_string(), "DB.PUBLIC");
        assert_eq!(column.database().to_string(), "DB");
        assert_eq!(
            column.scope().unwrap().to_string(),
            "TABLE DB.PUBLIC.ORDERS"
        );
    }

    #[tokio::test]
    async fn test_describe_filters_parent() {
        let rows = MockDriver::rows(
            &[("name", "text"), ("type", "text")],
            &[
                &[Some("ID"), Some("NUMBER(38,0)")],
                &[Some("AMOUNT"), Some("NUMBER(10,2)")],
            ],
        );
        let mock = Arc::new(MockDriver::new().on_query("RESULT_SCAN", rows));
        let column = Column::new("db", "public", "orders", "amount", Context::with_driver(mock.clone()))
            .unwrap();

        let batch = column.describe().await.unwrap();
        assert_eq!(batch.num_rows(), 1);
        let types = batch
            .column_by_name("type")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(types.value(0), "NUMBER(10,2)");
        assert_eq!(mock.executed_sql()[0], "DESCRIBE TABLE DB.PUBLIC.ORDERS");
    }
}
