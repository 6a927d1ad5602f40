//! Snowflake column schemas for record batches and existing tables

use std::collections::BTreeSet;

use arrow_array::RecordBatch;
use snowlib_arrow::{cell_text, is_json_eligible, lenient_cell_text, snowflake_type_for};

use crate::models::{SnowflakeObject, Table};
use crate::{Error, Result};

/// Snowflake types whose values are loaded through `PARSE_JSON`
const SEMI_STRUCTURED_TYPES: [&str; 3] = ["VARIANT", "OBJECT", "ARRAY"];

/// One column of a table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub snowflake_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, snowflake_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snowflake_type: snowflake_type.into(),
        }
    }

    /// `NAME TYPE`
    #[must_use]
    pub fn to_ddl(&self) -> String {
        format!("{} {}", self.name, self.snowflake_type)
    }

    #[must_use]
    pub fn is_semi_structured(&self) -> bool {
        SEMI_STRUCTURED_TYPES
            .iter()
            .any(|t| self.snowflake_type.eq_ignore_ascii_case(t))
    }
}

/// Column definitions for a new table holding `batch`.
///
/// Names are upper-cased. `variant_columns` forces VARIANT for the named
/// columns; without it, JSON-eligible nested columns become VARIANT.
#[must_use]
pub fn infer_snowflake_schema(
    batch: &RecordBatch,
    variant_columns: Option<&[String]>,
) -> Vec<ColumnSchema> {
    let variants: BTreeSet<String> = match variant_columns {
        Some(columns) => columns.iter().map(|c| c.to_uppercase()).collect(),
        None => detect_json_columns(batch).into_iter().collect(),
    };

    batch
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name().to_uppercase();
            let snowflake_type = if variants.contains(&name) {
                "VARIANT".to_string()
            } else {
                snowflake_type_for(field.data_type())
            };
            ColumnSchema::new(name, snowflake_type)
        })
        .collect()
}

/// Columns of an existing table with base types, e.g. `VARCHAR` for
/// `VARCHAR(16777216)`
pub async fn get_table_schema(table: &Table) -> Result<Vec<ColumnSchema>> {
    let described = table.describe().await?;
    let (Some(names), types) = (
        described.column_by_name("name"),
        described.column_by_name("type"),
    ) else {
        return Ok(Vec::new());
    };

    let mut schema = Vec::with_capacity(described.num_rows());
    for row in 0..described.num_rows() {
        let Some(name) = cell_text(names, row)? else {
            continue;
        };
        let full_type = match types {
            Some(types) => cell_text(types, row)?.unwrap_or_else(|| "VARCHAR".to_string()),
            None => "VARCHAR".to_string(),
        };
        let base_type = full_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        schema.push(ColumnSchema::new(name, base_type));
    }
    Ok(schema)
}

/// Schema to load `batch` into `table`.
///
/// An existing table keeps its own schema and must contain every batch
/// column; extra table columns receive NULL. A missing table gets the
/// inferred schema.
pub async fn resolve_target_schema(
    table: &Table,
    batch: &RecordBatch,
    variant_columns: Option<&[String]>,
) -> Result<Vec<ColumnSchema>> {
    Ok(target_schema(table, batch, variant_columns).await?.0)
}

/// [`resolve_target_schema`] plus whether the table already existed
pub(crate) async fn target_schema(
    table: &Table,
    batch: &RecordBatch,
    variant_columns: Option<&[String]>,
) -> Result<(Vec<ColumnSchema>, bool)> {
    if !table.exists().await? {
        return Ok((infer_snowflake_schema(batch, variant_columns), false));
    }

    let existing = get_table_schema(table).await?;
    let table_columns: BTreeSet<String> =
        existing.iter().map(|c| c.name.to_uppercase()).collect();
    let missing: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_uppercase())
        .filter(|name| !table_columns.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !missing.is_empty() {
        return Err(Error::invalid_argument(format!(
            "DataFrame has columns not in target table: {}. Table columns: {}",
            missing.join(", "),
            table_columns.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    Ok((existing, true))
}

/// `A INT, B VARCHAR`
#[must_use]
pub fn schema_to_ddl(schema: &[ColumnSchema]) -> String {
    schema
        .iter()
        .map(ColumnSchema::to_ddl)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Upper-cased names of JSON-eligible columns
#[must_use]
pub fn detect_json_columns(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(_, column)| is_json_eligible(column.as_ref()))
        .map(|(field, _)| field.name().to_uppercase())
        .collect()
}

/// Bind text for every cell, row-major, plus the names of the columns
/// whose cells were serialized as JSON documents.
///
/// Only JSON-eligible columns are held to strict JSON; other nested
/// columns load as text, so NaN and infinities in them do not fail.
/// Top-level nulls stay `None` so they load as SQL NULL rather than JSON
/// `null`.
pub fn prepare_json_columns(
    batch: &RecordBatch,
) -> Result<(Vec<Vec<Option<String>>>, Vec<String>)> {
    let eligible: Vec<bool> = batch
        .columns()
        .iter()
        .map(|column| is_json_eligible(column.as_ref()))
        .collect();
    let json_columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .zip(&eligible)
        .filter(|(_, json)| **json)
        .map(|(field, _)| field.name().clone())
        .collect();

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let cells = batch
            .columns()
            .iter()
            .zip(&eligible)
            .map(|(column, &json)| {
                if json {
                    cell_text(column, row)
                } else {
                    lenient_cell_text(column, row)
                }
            })
            .collect::<snowlib_arrow::Result<Vec<_>>>()?;
        rows.push(cells);
    }
    Ok((rows, json_columns))
}
