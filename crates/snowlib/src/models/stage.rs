//! Internal named stages and the files they hold

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::object::{Scope, SchemaChild, SnowflakeObject, object_identity};
use crate::context::Context;
use crate::execute::{Row, execute_sql};
use crate::sql::{Fqn, quote_literal};
use crate::Result;

/// Outcome of one `PUT`, as reported in its `status` column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploaded,
    Skipped,
    Error,
    Unknown,
    Other(String),
}

impl UploadStatus {
    fn parse(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "UPLOADED" => Self::Uploaded,
            "SKIPPED" => Self::Skipped,
            "ERROR" => Self::Error,
            "UNKNOWN" => Self::Unknown,
            _ => Self::Other(status.to_string()),
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Error | Self::Unknown)
    }
}

/// Per-file result of [`Stage::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub source: String,
    pub target: Option<String>,
    pub status: UploadStatus,
    pub message: Option<String>,
    pub query_id: Option<String>,
}

impl UploadResult {
    fn failed(source: String, message: impl Into<String>) -> Self {
        Self {
            source,
            target: None,
            status: UploadStatus::Error,
            message: Some(message.into()),
            query_id: None,
        }
    }
}

/// `PUT` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    pub auto_compress: bool,
    pub overwrite: bool,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            auto_compress: true,
            overwrite: false,
        }
    }
}

fn sql_bool(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

#[derive(Clone)]
pub struct Stage {
    fqn: Fqn,
    context: Context,
}

object_identity!(Stage);

#[async_trait]
impl SnowflakeObject for Stage {
    const SHOW_PLURAL: &'static str = "STAGES";
    const OBJECT_TYPE: &'static str = "STAGE";

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

impl SchemaChild for Stage {
    fn from_fqn(fqn: Fqn, context: Context) -> Self {
        Self { fqn, context }
    }
}

impl Stage {
    /// `@DATABASE.SCHEMA.STAGE`
    #[must_use]
    pub fn stage_path(&self) -> String {
        format!("@{}", self.fqn)
    }

    pub async fn create(&self, if_not_exists: bool) -> Result<&Self> {
        let guard = if if_not_exists { " IF NOT EXISTS" } else { "" };
        execute_sql(&format!("CREATE STAGE{guard} {}", self.fqn), &self.context).await?;
        Ok(self)
    }

    /// Session-scoped stage, removed by Snowflake when the session ends
    pub async fn create_temporary(&self) -> Result<&Self> {
        execute_sql(&format!("CREATE TEMPORARY STAGE {}", self.fqn), &self.context).await?;
        Ok(self)
    }

    pub async fn drop(&self, if_exists: bool) -> Result<()> {
        let guard = if if_exists { " IF EXISTS" } else { "" };
        execute_sql(&format!("DROP STAGE{guard} {}", self.fqn), &self.context).await?;
        Ok(())
    }

    /// Files in the stage, optionally filtered by a regular expression
    pub async fn list(&self, pattern: Option<&str>) -> Result<Vec<StageObject>> {
        let mut sql = format!("LIST {}", self.stage_path());
        if let Some(pattern) = pattern {
            sql.push_str(&format!(" PATTERN = {}", quote_literal(pattern)));
        }

        let rows = execute_sql(&sql, &self.context).await?.fetch_all().await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let listed = row.get("name")?;
                Some(StageObject {
                    name: self.relative_name(listed),
                    size: row.get("size").and_then(|s| s.parse().ok()).unwrap_or(0),
                    md5: row.get("md5").map(str::to_string),
                    last_modified: row.get("last_modified").unwrap_or_default().to_string(),
                    stage: self.clone(),
                })
            })
            .collect())
    }

    pub async fn objects(&self) -> Result<Vec<StageObject>> {
        self.list(None).await
    }

    /// `LIST` reports `stage_name/path`; strip that or the full `@fqn/` prefix
    fn relative_name(&self, listed: &str) -> String {
        let full = format!("{}/", self.stage_path());
        let short = format!("{}/", self.name());
        [full, short]
            .iter()
            .find_map(|prefix| {
                listed
                    .get(..prefix.len())
                    .filter(|head| head.eq_ignore_ascii_case(prefix))
                    .map(|_| listed[prefix.len()..].to_string())
            })
            .unwrap_or_else(|| listed.to_string())
    }

    /// Remove every file; one row per removed file
    pub async fn clear(&self) -> Result<Vec<Row>> {
        execute_sql(&format!("REMOVE {}", self.stage_path()), &self.context)
            .await?
            .fetch_all()
            .await
    }

    /// Upload local files with `PUT`.
    ///
    /// Failures are reported per file rather than returned as errors.
    pub async fn load(&self, files: &[PathBuf], options: PutOptions) -> Result<Vec<UploadResult>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.put(file, options).await);
        }

        let uploaded = results
            .iter()
            .filter(|r| r.status == UploadStatus::Uploaded)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.status == UploadStatus::Skipped)
            .count();
        let failed = results.iter().filter(|r| r.status.is_failed()).count();
        tracing::info!(
            stage = %self.fqn,
            "Upload complete: {uploaded} uploaded, {skipped} skipped, {failed} failed"
        );

        Ok(results)
    }

    async fn put(&self, file: &Path, options: PutOptions) -> UploadResult {
        let source = file.display().to_string();
        if !tokio::fs::try_exists(file).await.unwrap_or(false) {
            return UploadResult::failed(source, "File not found");
        }

        self.upload(file, options).await.unwrap_or_else(|e| {
            tracing::warn!(file = %source, error = %e, "Upload failed");
            UploadResult::failed(source, e.to_string())
        })
    }

    /// `PUT` one file. Statement errors are returned as they are; a status
    /// row reporting failure is still `Ok`.
    pub(crate) async fn upload(&self, file: &Path, options: PutOptions) -> Result<UploadResult> {
        let source = file.display().to_string();
        let location = file.to_string_lossy().replace('\\', "/");
        let sql = format!(
            "PUT 'file://{location}' {} AUTO_COMPRESS = {} OVERWRITE = {}",
            self.stage_path(),
            sql_bool(options.auto_compress),
            sql_bool(options.overwrite)
        );

        let result = execute_sql(&sql, &self.context).await?;
        let query_id = Some(result.query_id().to_string());
        Ok(match result.fetch_one().await? {
            Some(row) => UploadResult {
                source: row.get("source").map_or(source, str::to_string),
                target: row.get("target").map(str::to_string),
                status: row
                    .get("status")
                    .map_or(UploadStatus::Unknown, UploadStatus::parse),
                message: row.get("message").filter(|m| !m.is_empty()).map(str::to_string),
                query_id,
            },
            None => UploadResult {
                source,
                target: None,
                status: UploadStatus::Unknown,
                message: None,
                query_id,
            },
        })
    }
}

/// File inside a stage
#[derive(Clone)]
pub struct StageObject {
    pub name: String,
    pub size: u64,
    pub md5: Option<String>,
    pub last_modified: String,
    stage: Stage,
}

impl StageObject {
    /// `@DATABASE.SCHEMA.STAGE/name`
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}/{}", self.stage.stage_path(), self.name)
    }

    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    pub async fn exists(&self) -> Result<bool> {
        let result = execute_sql(&format!("LIST {}", self.path()), &self.stage.context).await?;
        Ok(result.fetch_one().await?.is_some())
    }

    /// `REMOVE` this file, returning the reported row
    pub async fn delete(&self) -> Result<Option<Row>> {
        execute_sql(&format!("REMOVE {}", self.path()), &self.stage.context)
            .await?
            .fetch_one()
            .await
    }
}

impl fmt::Debug for StageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageObject('{}', size={})", self.name, self.size)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::driver::mock::MockDriver;

    fn stage(mock: &Arc<MockDriver>) -> Stage {
        Stage::new("db", "public", "landing", Context::with_driver(mock.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let mock = Arc::new(MockDriver::new());
        let stage = stage(&mock);

        stage.create(true).await.unwrap();
        stage.create(false).await.unwrap();
        stage.create_temporary().await.unwrap();
        stage.drop(true).await.unwrap();

        assert_eq!(
            mock.executed_sql(),
            vec![
                "CREATE STAGE IF NOT EXISTS DB.PUBLIC.LANDING",
                "CREATE STAGE DB.PUBLIC.LANDING",
                "CREATE TEMPORARY STAGE DB.PUBLIC.LANDING",
                "DROP STAGE IF EXISTS DB.PUBLIC.LANDING"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_strips_prefix() {
        let rows = MockDriver::rows(
            &[("name", "text"), ("size", "fixed"), ("md5", "text"), ("last_modified", "text")],
            &[
                &[
                    Some("landing/2024/data.csv.gz"),
                    Some("128"),
                    Some("abc"),
                    Some("Tue, 1 Oct 2024 10:00:00 GMT"),
                ],
                &[Some("@DB.PUBLIC.LANDING/raw.json"), Some("64"), None, Some("")],
            ],
        );
        let mock = Arc::new(MockDriver::new().on_query("LIST", rows));
        let stage = stage(&mock);

        let objects = stage.list(Some(".*\\.csv.*")).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "2024/data.csv.gz");
        assert_eq!(objects[0].size, 128);
        assert_eq!(objects[0].md5.as_deref(), Some("abc"));
        assert_eq!(objects[0].path(), "@DB.PUBLIC.LANDING/2024/data.csv.gz");
        assert_eq!(objects[1].name, "raw.json");
        assert_eq!(
            mock.executed_sql()[0],
            "LIST @DB.PUBLIC.LANDING PATTERN = '.*\\\\.csv.*'"
        );
    }

    #[tokio::test]
    async fn test_object_exists_and_delete() {
        let mock = Arc::new(
            MockDriver::new()
                .on_query("LIST", MockDriver::rows(&[("name", "text")], &[&[Some("landing/a.csv")]]))
                .on_query("REMOVE", MockDriver::scalar("result", Some("removed"))),
        );
        let stage = stage(&mock);
        let object = stage.objects().await.unwrap().remove(0);

        assert!(object.exists().await.unwrap());
        let removed = object.delete().await.unwrap().unwrap();
        assert_eq!(removed.get("result"), Some("removed"));
        assert_eq!(stage.clear().await.unwrap().len(), 1);

        let sql = mock.executed_sql();
        assert_eq!(sql[1], "LIST @DB.PUBLIC.LANDING/a.csv");
        assert_eq!(sql[2], "REMOVE @DB.PUBLIC.LANDING/a.csv");
        assert_eq!(sql[3], "REMOVE @DB.PUBLIC.LANDING");
    }

    #[tokio::test]
    async fn test_load_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("orders.csv");
        std::fs::write(&present, "id\n1\n").unwrap();
        let missing = dir.path().join("missing.csv");

        let put = MockDriver::rows(
            &[("source", "text"), ("target", "text"), ("status", "text"), ("message", "text")],
            &[&[Some("orders.csv"), Some("orders.csv.gz"), Some("UPLOADED"), Some("")]],
        );
        let mock = Arc::new(MockDriver::new().on_query("PUT", put));
        let stage = stage(&mock);

        let results = stage
            .load(&[present.clone(), missing.clone()], PutOptions::default())
            .await
            .unwrap();

        assert_eq!(results[0].status, UploadStatus::Uploaded);
        assert_eq!(results[0].target.as_deref(), Some("orders.csv.gz"));
        assert!(results[0].query_id.is_some());
        assert_eq!(results[0].message, None);

        assert_eq!(results[1].status, UploadStatus::Error);
        assert_eq!(results[1].message.as_deref(), Some("File not found"));
        assert_eq!(results[1].source, missing.display().to_string());

        let sql = mock.executed_sql();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with("PUT 'file://"));
        assert!(sql[0].ends_with("orders.csv' @DB.PUBLIC.LANDING AUTO_COMPRESS = TRUE OVERWRITE = FALSE"));
    }

    #[tokio::test]
    async fn test_load_turns_errors_into_results() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.csv");
        std::fs::write(&file, "x").unwrap();
        let mock = Arc::new(MockDriver::new().on_error("PUT", "253006", "", "stage missing"));

        let results = stage(&mock)
            .load(&[file], PutOptions { auto_compress: false, overwrite: true })
            .await
            .unwrap();
        assert!(results[0].status.is_failed());
        assert!(results[0].message.as_deref().unwrap().contains("stage missing"));
        assert!(mock.executed_sql()[0].ends_with("AUTO_COMPRESS = FALSE OVERWRITE = TRUE"));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(UploadStatus::parse("uploaded"), UploadStatus::Uploaded);
        assert!(UploadStatus::parse("UNKNOWN").is_failed());
        assert!(!UploadStatus::parse("SKIPPED").is_failed());
        assert_eq!(
            UploadStatus::parse("RENAMED"),
            UploadStatus::Other("RENAMED".into())
        );
    }
}
