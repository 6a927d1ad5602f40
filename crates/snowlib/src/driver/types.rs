//! Request and response bodies of the SQL API

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use snowlib_arrow::ColumnMetadata;

use crate::constants::UNKNOWN_ROWCOUNT;

/// One cell as returned by the SQL API
pub type Cell = Option<String>;

/// Positional bind value
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Fixed(i64),
    Real(f64),
    Boolean(bool),
    Null,
}

impl BindValue {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) | Self::Null => "TEXT",
            Self::Fixed(_) => "FIXED",
            Self::Real(_) => "REAL",
            Self::Boolean(_) => "BOOLEAN",
        }
    }

    /// Value as the API transmits it: always text, or JSON `null`
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Fixed(n) => Some(n.to_string()),
            Self::Real(f) => Some(f.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Null => None,
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for BindValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Fixed(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        Self::Fixed(i64::from(value))
    }
}

impl From<usize> for BindValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Text(value.to_string()), Self::Fixed)
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// SQL text plus positional bindings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<BindValue>,
    /// `Some(0)` allows any number of `;`-separated statements
    pub multi_statement_count: Option<u32>,
}

impl Statement {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<BindValue>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Run as a multi-statement block
    #[must_use]
    pub const fn multi_statement(mut self) -> Self {
        self.multi_statement_count = Some(0);
        self
    }

    /// `PUT` and `GET` move files between client and stage
    #[must_use]
    pub fn is_file_transfer(&self) -> bool {
        let head = self
            .sql
            .trim_start()
            .split_whitespace()
            .next()
            .unwrap_or_default();
        head.eq_ignore_ascii_case("PUT") || head.eq_ignore_ascii_case("GET")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Binding {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub value: Option<String>,
}

/// Body of `POST /api/v2/statements`
#[derive(Debug, Serialize)]
pub(crate) struct StatementRequest<'a> {
    pub statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, Binding>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

pub(crate) fn encode_bindings(bindings: &[BindValue]) -> BTreeMap<String, Binding> {
    bindings
        .iter()
        .enumerate()
        .map(|(i, value)| {
            (
                (i + 1).to_string(),
                Binding {
                    type_name: value.type_name(),
                    value: value.as_text(),
                },
            )
        })
        .collect()
}

/// Partition sizes reported in result metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub uncompressed_size: u64,
    #[serde(default)]
    pub compressed_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetMetaData {
    #[serde(default)]
    pub num_rows: Option<i64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub row_type: Vec<ColumnMetadata>,
    #[serde(default)]
    pub partition_info: Vec<PartitionInfo>,
}

/// DML counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementStats {
    #[serde(default)]
    pub num_rows_inserted: i64,
    #[serde(default)]
    pub num_rows_updated: i64,
    #[serde(default)]
    pub num_rows_deleted: i64,
    #[serde(default)]
    pub num_dml_duplicates: i64,
}

/// Statement response, complete or in progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub sql_state: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub statement_handle: Option<String>,
    #[serde(default)]
    pub statement_handles: Option<Vec<String>>,
    #[serde(default)]
    pub result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    pub data: Option<Vec<Vec<Cell>>>,
    #[serde(default)]
    pub stats: Option<StatementStats>,
}

impl StatementResponse {
    #[must_use]
    pub fn row_type(&self) -> &[ColumnMetadata] {
        self.result_set_meta_data
            .as_ref()
            .map_or(&[], |meta| meta.row_type.as_slice())
    }

    /// Number of result partitions, at least one
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.result_set_meta_data
            .as_ref()
            .map_or(1, |meta| meta.partition_info.len().max(1))
    }

    /// Affected rows for DML, result rows otherwise, `-1` when unknown
    #[must_use]
    pub fn rowcount(&self) -> i64 {
        if let Some(stats) = &self.stats {
            return stats.num_rows_inserted + stats.num_rows_updated + stats.num_rows_deleted;
        }
        self.result_set_meta_data
            .as_ref()
            .and_then(|meta| meta.num_rows)
            .unwrap_or(UNKNOWN_ROWCOUNT)
    }
}

/// Body of `GET /api/v2/statements/{handle}?partition=n` for n > 0
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PartitionResponse {
    #[serde(default)]
    pub data: Vec<Vec<Cell>>,
}

/// Outcome of one status poll
#[derive(Debug, Clone, PartialEq)]
pub enum StatementState {
    Running,
    Complete(Box<StatementResponse>),
}

/// Status names reported for asynchronous queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    Running,
    Success,
    FailedWithError,
    Aborted,
}

impl QueryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::FailedWithError => "FAILED_WITH_ERROR",
            Self::Aborted => "ABORTED",
        }
    }

    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
