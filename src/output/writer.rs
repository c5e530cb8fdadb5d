//! Parquet file writer

use crate::error::{Error, Result};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 64 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Get compression
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Compression by name: `snappy`, `zstd` or `none`
impl FromStr for ParquetWriterConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let compression = match s.to_ascii_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" | "uncompressed" => Compression::UNCOMPRESSED,
            other => {
                return Err(Error::invalid_value(
                    "compression",
                    format!("unknown codec '{other}', expected snappy, zstd or none"),
                ))
            }
        };
        Ok(Self::default().with_compression(compression))
    }
}

/// Parquet file writer
pub struct ParquetWriter {
    writer: ArrowWriter<File>,
    rows_written: usize,
}

impl ParquetWriter {
    /// Create `path` for batches of `schema`
    pub fn create(
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.display()),
        })?;

        let writer = ArrowWriter::try_new(file, schema, Some(config.build_properties()))
            .map_err(|e| Error::Output {
                message: format!("Failed to create Parquet writer: {e}"),
            })?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch to the file
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;
        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Close the writer and finalize the file
    pub fn close(self) -> Result<usize> {
        let rows = self.rows_written;
        self.writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(rows)
    }
}
