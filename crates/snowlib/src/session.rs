//! One entry point bundling a context with execution and model access

use std::fmt;
use std::path::Path;

use arrow_array::RecordBatch;

use crate::config::ConnectionOverrides;
use crate::context::Context;
use crate::driver::BindValue;
use crate::execute::{AsyncQuery, Executor, QueryResult};
use crate::models::{
    Database, DynamicTable, MaterializedView, Schema, SchemaChild, Stage, Table, View,
};
use crate::Result;

/// Context plus shorthands for statements and models.
///
/// A session opened from a profile owns its connection and closes it in
/// [`Session::close`]; one wrapping an existing context leaves it open.
pub struct Session {
    context: Context,
    owned: bool,
}

impl Session {
    pub fn from_profile(
        profile: &str,
        path: Option<&Path>,
        overrides: ConnectionOverrides,
    ) -> Result<Self> {
        Ok(Self {
            context: Context::from_profile(profile, path, overrides)?,
            owned: true,
        })
    }

    #[must_use]
    pub const fn from_context(context: Context) -> Self {
        Self {
            context,
            owned: false,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    fn executor(&self) -> Executor {
        Executor::new(self.context.clone())
    }

    pub async fn execute_sql(&self, sql: &str, bindings: &[BindValue]) -> Result<QueryResult> {
        self.executor().run(sql, bindings).await
    }

    /// Result as one batch with lower-case column names
    pub async fn query(&self, sql: &str, bindings: &[BindValue]) -> Result<RecordBatch> {
        self.execute_sql(sql, bindings).await?.to_batch(true).await
    }

    pub async fn execute_sql_async(&self, sql: &str, bindings: &[BindValue]) -> Result<AsyncQuery> {
        self.executor().run_async(sql, bindings).await
    }

    pub async fn execute_block(&self, sql: &str) -> Result<Vec<QueryResult>> {
        self.executor().run_block(sql).await
    }

    pub fn database(&self, name: &str) -> Result<Database> {
        Database::from_name(name, self.context.clone())
    }

    /// `db.schema` or `schema` in the current database
    pub async fn schema(&self, name: &str) -> Result<Schema> {
        Schema::from_name(name, &self.context, None).await
    }

    /// Any schema-level object by `db.schema.name`, `schema.name` or `name`
    pub async fn object<T: SchemaChild>(&self, name: &str) -> Result<T> {
        T::from_name(name, &self.context, None, None).await
    }

    pub async fn table(&self, name: &str) -> Result<Table> {
        self.object(name).await
    }

    pub async fn view(&self, name: &str) -> Result<View> {
        self.object(name).await
    }

    pub async fn materialized_view(&self, name: &str) -> Result<MaterializedView> {
        self.object(name).await
    }

    pub async fn dynamic_table(&self, name: &str) -> Result<DynamicTable> {
        self.object(name).await
    }

    pub async fn stage(&self, name: &str) -> Result<Stage> {
        self.object(name).await
    }

    /// Close the connection when this session opened it
    pub async fn close(&self) -> Result<()> {
        if self.owned {
            self.context.close().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .field("owned", &self.owned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::driver::mock::MockDriver;

    fn session() -> (Arc<MockDriver>, Session) {
        let mock = Arc::new(
            MockDriver::new()
                .on_query("CURRENT_DATABASE", MockDriver::scalar("D", Some("ANALYTICS")))
                .on_query("CURRENT_SCHEMA", MockDriver::scalar("S", Some("RAW")))
                .on_query("FROM EVENTS", MockDriver::scalar("N", Some("4"))),
        );
        let session = Session::from_context(Context::with_driver(mock.clone()));
        (mock, session)
    }

    #[tokio::test]
    async fn test_statements() {
        let (mock, session) = session();

        let batch = session
            .query("SELECT COUNT(*) AS N FROM EVENTS WHERE KIND = ?", &["click".into()])
            .await
            .unwrap();
        assert_eq!(batch.schema().field(0).name(), "n");

        let running = session.execute_sql_async("SELECT 1", &[]).await.unwrap();
        assert!(!running.query_id().is_empty());

        let results = session.execute_block("SELECT 1; SELECT 2").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(mock.executed()[0].bindings, vec![BindValue::Text("click".into())]);
    }

    #[tokio::test]
    async fn test_model_factories() {
        let (_, session) = session();

        assert_eq!(session.table("events").await.unwrap().to_string(), "ANALYTICS.RAW.EVENTS");
        assert_eq!(session.view("raw.v").await.unwrap().to_string(), "ANALYTICS.RAW.V");
        assert_eq!(
            session.dynamic_table("prod.core.dt").await.unwrap().to_string(),
            "PROD.CORE.DT"
        );
        assert_eq!(
            session.materialized_view("mv").await.unwrap().to_string(),
            "ANALYTICS.RAW.MV"
        );
        assert_eq!(session.stage("landing").await.unwrap().stage_path(), "@ANALYTICS.RAW.LANDING");
        assert_eq!(session.schema("raw").await.unwrap().to_string(), "ANALYTICS.RAW");
        assert_eq!(session.database("prod").unwrap().to_string(), "PROD");
    }

    #[tokio::test]
    async fn test_close_only_when_owned() {
        let (mock, borrowed) = session();
        borrowed.close().await.unwrap();
        assert!(!mock.is_closed());

        let owned = Session {
            context: Context::with_driver(mock.clone()),
            owned: true,
        };
        owned.close().await.unwrap();
        assert!(mock.is_closed());
    }
}
