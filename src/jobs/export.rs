//! Table export to CSV or Parquet
//!
//! Rows arrive in fetch order, which is not offset order when more than one
//! fetcher runs.

use crate::api::{Api, Criteria};
use crate::error::{Error, Result};
use crate::output::{OutputFormat, ParquetWriterConfig, RecordSink};
use crate::pipeline::{spawn_fetch, FetchOptions, PipelineStats, TableSource, TaskGroup};
use crate::types::{ReadMode, Record};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// What to export and where
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Table name or join expression
    pub table: String,
    pub criteria: Criteria,
    pub mode: ReadMode,
    /// Columns to write. Empty means every column `describe` lists.
    pub fields: Vec<String>,
    pub format: OutputFormat,
    pub output: PathBuf,
    pub parquet: ParquetWriterConfig,
    pub fetch: FetchOptions,
}

/// Outcome of an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub table: String,
    pub records: u64,
    pub fields: usize,
    pub output: String,
}

/// Stream a table into a file
pub async fn run(api: &Api, options: ExportOptions) -> Result<ExportReport> {
    let table = api.table(options.table.clone());
    let fields = if options.fields.is_empty() {
        if options.mode == ReadMode::LeftJoin {
            return Err(Error::config("exporting a join needs an explicit field list"));
        }
        table
            .describe()
            .await?
            .into_iter()
            .map(|f| f.name)
            .filter(|n| !n.is_empty())
            .collect()
    } else {
        options.fields.clone()
    };
    info!(
        table = %table.name(),
        fields = fields.len(),
        format = ?options.format,
        output = %options.output.display(),
        "Export starting"
    );

    let mut sink = RecordSink::create(&options.output, options.format, &fields, &options.parquet)?;

    let source = match options.mode {
        ReadMode::Objects => TableSource::<Record>::objects(table, options.criteria).counted(true),
        ReadMode::LeftJoin => TableSource::<Record>::left_join(table, options.criteria),
    };
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let mut records = spawn_fetch(&mut group, Arc::new(source), options.fetch, Arc::clone(&stats));

    let written = group
        .drive(async move {
            while let Some(record) = records.recv().await {
                sink.write(&record)?;
            }
            sink.finish()
        })
        .await?;

    let report = ExportReport {
        table: options.table,
        records: written as u64,
        fields: fields.len(),
        output: options.output.display().to_string(),
    };
    info!(?report, "Export done");
    Ok(report)
}
