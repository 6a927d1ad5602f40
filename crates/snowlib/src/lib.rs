//! Profile-driven convenience layer over the Snowflake SQL API
//!
//! Connection settings come from named profiles in `connections.toml`.
//! Statements run through a lazily opened [`Context`], results convert to
//! Arrow record batches, and [`models`] wraps `SHOW`/`DESCRIBE` in typed
//! handles for databases, schemas, tables and stages.

pub mod auth;
pub mod config;
pub mod connector;
mod constants;
pub mod context;
pub mod driver;
mod error;
pub mod execute;
pub mod io;
pub mod models;
pub mod observability;
pub mod session;
pub mod sql;

pub use config::{ConnectionOverrides, ConnectionParams, Profile, connection_url, list_profiles};
pub use connector::Connector;
pub use context::Context;
pub use driver::{BindValue, Driver, HttpDriver};
pub use error::{CANCELLED_ERROR_CODE, Error, Result};
pub use execute::{
    AsyncQuery, Executor, QueryResult, Row, execute_block, execute_sql, execute_sql_async,
    fetch_all, fetch_batches, fetch_one, query,
};
pub use io::{LoadMethod, WriteMode, WriteOptions};
pub use models::{
    Column, Database, DynamicTable, MaterializedView, Schema, SchemaChild, SnowflakeObject, Stage,
    Table, TableLike, View,
};
pub use session::Session;
pub use sql::{Fqn, SafeQuery};
