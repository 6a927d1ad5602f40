//! Object models over `SHOW`, `DESCRIBE` and DDL
//!
//! Every model is an immutable handle identified by its fully qualified,
//! upper-cased name. Nothing is cached: existence, metadata and listings are
//! read from Snowflake on each call. Only unquoted identifiers are supported.

mod column;
mod database;
mod object;
mod schema;
mod show;
mod stage;
mod table;

pub use column::Column;
pub use database::Database;
pub use object::{SchemaChild, Scope, SnowflakeObject};
pub use schema::Schema;
pub use show::{Show, ShowFilter, show_sql};
pub use stage::{PutOptions, Stage, StageObject, UploadResult, UploadStatus};
pub use table::{DynamicTable, MaterializedView, Table, TableLike, View};
