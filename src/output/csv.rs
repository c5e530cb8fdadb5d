//! CSV writer
//!
//! RFC 4180 quoting: fields holding the delimiter, a quote or a line break
//! are quoted, and quotes are doubled.

use crate::error::{Error, Result};
use crate::types::{Record, RecordExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Row-at-a-time CSV writer with a fixed header
pub struct CsvWriter<W: Write> {
    out: W,
    headers: Vec<String>,
    rows_written: usize,
}

impl CsvWriter<BufWriter<File>> {
    /// Create `path` and write the header
    pub fn create(path: impl AsRef<Path>, headers: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            Error::output(format!("Failed to create {}: {e}", path.display()))
        })?;
        Self::new(BufWriter::new(file), headers)
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `out` and write the header
    pub fn new(out: W, headers: Vec<String>) -> Result<Self> {
        let mut writer = Self {
            out,
            headers,
            rows_written: 0,
        };
        let header = writer.headers.clone();
        writer.write_line(&header)?;
        Ok(writer)
    }

    /// Column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Write one row of values, in header order
    pub fn write_row<S: AsRef<str>>(&mut self, row: &[S]) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(Error::output(format!(
                "row has {} values, header has {}",
                row.len(),
                self.headers.len()
            )));
        }
        self.write_line(row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write the header's fields from `record`; missing fields are empty
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let row: Vec<String> = self.headers.iter().map(|h| record.text(h)).collect();
        self.write_row(&row)
    }

    fn write_line<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        let line = values
            .iter()
            .map(|v| escape_field(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// Rows written so far, header excluded
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and return the row count
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.rows_written)
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Quote a field if it needs it
pub fn escape_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        std::borrow::Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        std::borrow::Cow::Borrowed(value)
    }
}
