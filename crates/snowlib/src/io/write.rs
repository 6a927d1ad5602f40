use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use snowlib_arrow::{is_nested, lenient_cell_text};
use tempfile::TempDir;
use uuid::Uuid;

use super::schema::{
    detect_json_columns, infer_snowflake_schema, prepare_json_columns, schema_to_ddl,
    target_schema,
};
use super::{LoadMethod, WriteMode, WriteOptions};
use crate::constants::INSERT_CHUNK_ROWS;
use crate::context::Context;
use crate::driver::BindValue;
use crate::execute::{Executor, execute_sql, table_exists};
use crate::models::{PutOptions, SchemaChild, Stage, Table};
use crate::sql::{TableName, resolve_table_name, validate_identifier};
use crate::{Error, Result};

/// Write `batch` to `table`, creating the table when needed.
///
/// Columns are validated and every cell converted before any DDL runs, so
/// a batch that cannot be loaded leaves the target table untouched.
///
/// Returns the number of rows loaded.
pub async fn write(
    batch: &RecordBatch,
    table: &str,
    context: &Context,
    options: &WriteOptions,
) -> Result<usize> {
    let mut name = resolve_table_name(table, context).await?;
    if options.uppercase_table {
        name = TableName {
            database: name.database.to_uppercase(),
            schema: name.schema.to_uppercase(),
            table: name.table.to_uppercase(),
        };
    }
    let qualified = name.to_string();

    let batch = if options.uppercase_columns {
        uppercase_columns(batch)?
    } else {
        batch.clone()
    };
    let columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    for column in &columns {
        validate_identifier(column)?;
    }

    if options.load_method == LoadMethod::Stage
        && !context.driver().await?.supports_file_transfer()
    {
        return Err(Error::NotSupported(format!(
            "This connection cannot PUT files; write {qualified} with LoadMethod::Insert"
        )));
    }

    let variant_columns = options.variant_columns.as_deref();
    let (schema, existed) = match options.mode {
        WriteMode::Replace => (infer_snowflake_schema(&batch, variant_columns), false),
        WriteMode::Fail => {
            if table_exists(context, &name.table, &name.schema, &name.database).await? {
                return Err(Error::AlreadyExists(format!(
                    "Table {qualified} already exists"
                )));
            }
            (infer_snowflake_schema(&batch, variant_columns), false)
        }
        WriteMode::Append => {
            let target = Table::new(&name.database, &name.schema, &name.table, context.clone())?;
            target_schema(&target, &batch, variant_columns).await?
        }
    };

    let json_columns = detect_json_columns(&batch);
    let parse_json: Vec<bool> = columns
        .iter()
        .map(|column| {
            json_columns.iter().any(|c| c.eq_ignore_ascii_case(column))
                || schema
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(column) && c.is_semi_structured())
        })
        .collect();

    let load = Load {
        table: &qualified,
        columns: &columns,
        parse_json: &parse_json,
        context,
    };
    let payload = match options.load_method {
        LoadMethod::Insert => Payload::Rows(prepare_json_columns(&batch)?.0),
        LoadMethod::Stage => Payload::Parquet(load.parquet_file(&batch)?),
    };

    if options.mode == WriteMode::Replace {
        execute_sql(&format!("DROP TABLE IF EXISTS {qualified}"), context).await?;
    }
    if !existed {
        let ddl = schema_to_ddl(&schema);
        execute_sql(&format!("CREATE TABLE IF NOT EXISTS {qualified} ({ddl})"), context).await?;
    }

    if batch.num_rows() == 0 {
        return Ok(0);
    }

    let loaded = match payload {
        Payload::Rows(rows) => load.insert(&rows).await?,
        Payload::Parquet(file) => load.stage(&name, &file.path, batch.num_rows()).await?,
    };

    tracing::info!(
        table = %qualified,
        rows = loaded,
        mode = options.mode.as_str(),
        method = options.load_method.as_str(),
        "Wrote batch"
    );
    Ok(loaded)
}

/// Converted rows, ready to load
enum Payload {
    Rows(Vec<Vec<Option<String>>>),
    Parquet(ParquetFile),
}

/// Parquet file in a directory removed on drop
struct ParquetFile {
    _dir: TempDir,
    path: PathBuf,
}

fn uppercase_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(f.name().to_uppercase()))
        .collect();
    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        batch.columns().to_vec(),
    )?)
}

/// Target of one write, with the columns that go through `PARSE_JSON`
struct Load<'a> {
    table: &'a str,
    columns: &'a [String],
    parse_json: &'a [bool],
    context: &'a Context,
}

impl Load<'_> {
    fn column_list(&self) -> String {
        self.columns.join(", ")
    }

    /// `$1, PARSE_JSON($2), ...`
    fn values_projection(&self) -> String {
        self.parse_json
            .iter()
            .enumerate()
            .map(|(i, &json)| {
                if json {
                    format!("PARSE_JSON(${})", i + 1)
                } else {
                    format!("${}", i + 1)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `$1:"A", PARSE_JSON($1:"B"::STRING), ...`
    fn parquet_projection(&self) -> String {
        self.columns
            .iter()
            .zip(self.parse_json)
            .map(|(column, &json)| {
                if json {
                    format!("PARSE_JSON($1:\"{column}\"::STRING)")
                } else {
                    format!("$1:\"{column}\"")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn insert(&self, rows: &[Vec<Option<String>>]) -> Result<usize> {
        let executor = Executor::new(self.context.clone());
        let row_placeholder = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let prefix = format!(
            "INSERT INTO {} ({}) SELECT {} FROM VALUES ",
            self.table,
            self.column_list(),
            self.values_projection()
        );

        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let sql = format!("{prefix}{}", vec![row_placeholder.as_str(); chunk.len()].join(", "));
            let bindings: Vec<BindValue> = chunk
                .iter()
                .flatten()
                .map(|cell| BindValue::from(cell.clone()))
                .collect();

            let result = executor.run(&sql, &bindings).await?;
            inserted += usize::try_from(result.rowcount()).unwrap_or(chunk.len());
            tracing::debug!(table = self.table, rows = chunk.len(), "Inserted chunk");
        }
        Ok(inserted)
    }

    /// Parquet through a temporary stage that is dropped whatever the outcome
    async fn stage(&self, name: &TableName, file: &Path, rows: usize) -> Result<usize> {
        let stage_name = format!("SNOWLIB_STAGE_{}", Uuid::new_v4().simple()).to_uppercase();
        let stage = Stage::new(&name.database, &name.schema, &stage_name, self.context.clone())?;
        stage.create_temporary().await?;

        let loaded = self.copy_through(&stage, file, rows).await;
        match (loaded, stage.drop(true).await) {
            (Ok(rows), Ok(())) => Ok(rows),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), dropped) => {
                if let Err(drop_error) = dropped {
                    tracing::warn!(stage = %stage, error = %drop_error, "Failed to drop load stage");
                }
                Err(e)
            }
        }
    }

    async fn copy_through(&self, stage: &Stage, file: &Path, rows: usize) -> Result<usize> {
        let upload = stage
            .upload(
                file,
                PutOptions {
                    auto_compress: false,
                    overwrite: true,
                },
            )
            .await?;
        if upload.status.is_failed() {
            return Err(Error::Io(std::io::Error::other(format!(
                "Failed to upload {} to {}: {}",
                upload.source,
                stage.stage_path(),
                upload.message.as_deref().unwrap_or("no status reported")
            ))));
        }

        let sql = format!(
            "COPY INTO {} ({}) FROM (SELECT {} FROM {}) \
             FILE_FORMAT = (TYPE = PARQUET) PURGE = TRUE",
            self.table,
            self.column_list(),
            self.parquet_projection(),
            stage.stage_path()
        );
        let reported: Vec<usize> = execute_sql(&sql, self.context)
            .await?
            .fetch_all()
            .await?
            .iter()
            .filter_map(|row| row.get("rows_loaded").and_then(|n| n.parse().ok()))
            .collect();

        if reported.is_empty() {
            Ok(rows)
        } else {
            Ok(reported.iter().sum())
        }
    }

    fn parquet_file(&self, batch: &RecordBatch) -> Result<ParquetFile> {
        let dir = tempfile::tempdir()?;
        let path = dir
            .path()
            .join(format!("snowlib_{}.parquet", Uuid::new_v4().simple()));
        write_parquet(&path, &self.json_as_text(batch)?)?;
        Ok(ParquetFile { _dir: dir, path })
    }

    /// Nested columns headed for `PARSE_JSON` become JSON text
    fn json_as_text(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(batch.num_columns());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

        for ((field, array), &json) in batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .zip(self.parse_json)
        {
            if json && is_nested(field.data_type()) {
                let text = (0..array.len())
                    .map(|row| lenient_cell_text(array, row))
                    .collect::<snowlib_arrow::Result<StringArray>>()?;
                fields.push(Field::new(field.name(), DataType::Utf8, true));
                arrays.push(Arc::new(text));
            } else {
                fields.push(field.as_ref().clone());
                arrays.push(array.clone());
            }
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
