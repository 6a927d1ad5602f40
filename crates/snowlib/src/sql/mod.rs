//! Identifier validation, qualified names and query assembly

mod fqn;
mod identifier;
mod names;
mod query;

pub use fqn::Fqn;
pub use identifier::{is_valid_identifier, quote_literal, validate_identifier};
pub use names::{TableName, format_qualified_name, parse_table_name, resolve_table_name};
pub use query::SafeQuery;
