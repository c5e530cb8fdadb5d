//! Output module
//!
//! Writes CRM records to files:
//! - CSV with a fixed header, one row per record
//! - Parquet with nullable text columns, written in batches
//!
//! `RecordSink` picks one of them by `OutputFormat`.

mod csv;
mod schema;
mod writer;

pub use csv::{escape_field, CsvWriter};
pub use schema::{batch_to_records, field_names, records_to_batch, string_schema};
pub use writer::{ParquetWriter, ParquetWriterConfig};

use crate::error::{Error, Result};
use crate::types::Record;
use arrow::datatypes::Schema;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Records buffered before a Parquet batch is written
const PARQUET_BATCH_ROWS: usize = 1000;

/// File format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => Err(Error::invalid_value(
                "format",
                format!("unknown output format '{other}'"),
            )),
        }
    }
}

/// A file that records are streamed into
pub enum RecordSink {
    Csv(CsvWriter<BufWriter<File>>),
    Parquet {
        writer: ParquetWriter,
        schema: Arc<Schema>,
        pending: Vec<Record>,
    },
}

impl RecordSink {
    /// Create `path` with one column per entry of `fields`
    pub fn create(
        path: impl AsRef<Path>,
        format: OutputFormat,
        fields: &[String],
        parquet: &ParquetWriterConfig,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::output("no fields to write"));
        }
        match format {
            OutputFormat::Csv => Ok(Self::Csv(CsvWriter::create(path, fields.to_vec())?)),
            OutputFormat::Parquet => {
                let schema = Arc::new(string_schema(fields));
                let writer = ParquetWriter::create(path, Arc::clone(&schema), parquet)?;
                Ok(Self::Parquet {
                    writer,
                    schema,
                    pending: Vec::with_capacity(PARQUET_BATCH_ROWS),
                })
            }
        }
    }

    /// Append one record
    pub fn write(&mut self, record: &Record) -> Result<()> {
        match self {
            Self::Csv(csv) => csv.write_record(record),
            Self::Parquet {
                writer,
                schema,
                pending,
            } => {
                pending.push(record.clone());
                if pending.len() >= PARQUET_BATCH_ROWS {
                    let batch = records_to_batch(schema, pending)?;
                    writer.write(&batch)?;
                    pending.clear();
                }
                Ok(())
            }
        }
    }

    /// Flush, close and return the number of records written
    pub fn finish(self) -> Result<usize> {
        match self {
            Self::Csv(csv) => csv.finish(),
            Self::Parquet {
                mut writer,
                schema,
                pending,
            } => {
                if !pending.is_empty() {
                    writer.write(&records_to_batch(&schema, &pending)?)?;
                }
                writer.close()
            }
        }
    }
}
