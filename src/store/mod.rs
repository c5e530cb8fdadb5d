//! Local statistics store backed by DuckDB
//!
//! Jobs that need to aggregate more rows than they want to hold in memory
//! write them here and query the totals at the end.

use crate::error::{Error, Result};
use duckdb::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

const CREATE_EMAIL_STATS: &str = "
CREATE TABLE IF NOT EXISTS email_stats(
    year INTEGER NOT NULL,
    supporter_KEY BIGINT,
    status VARCHAR NOT NULL
);";

/// One sent email, reduced to what the yearly summary needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailStat {
    pub year: i32,
    pub supporter_key: Option<i64>,
    pub status: String,
}

/// Emails per year and delivery status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearStatus {
    pub year: i32,
    pub status: String,
    pub emails: i64,
    pub supporters: i64,
}

/// DuckDB database holding job statistics
pub struct StatsStore {
    conn: Connection,
    location: String,
}

impl StatsStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::config(format!("Failed to open DuckDB at {}: {e}", path.display()))
        })?;
        Self::init(conn, path.display().to_string())
    }

    /// In-memory database, gone when dropped
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        Self::init(conn, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(CREATE_EMAIL_STATS)?;
        debug!(location = %location, "Opened stats store");
        Ok(Self { conn, location })
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Append a batch of email rows
    pub fn insert_email_stats(&self, rows: &[EmailStat]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut appender = self.conn.appender("email_stats")?;
        for row in rows {
            appender.append_row(params![row.year, row.supporter_key, row.status])?;
        }
        appender.flush()?;
        Ok(rows.len())
    }

    /// Number of stored email rows
    pub fn email_stat_count(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM email_stats", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Email and distinct supporter counts per year and status
    pub fn year_summary(&self) -> Result<Vec<YearStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, status, COUNT(*), COUNT(DISTINCT supporter_KEY)
             FROM email_stats
             GROUP BY year, status
             ORDER BY year, status",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(YearStatus {
                year: row.get(0)?,
                status: row.get(1)?,
                emails: row.get(2)?,
                supporters: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl std::fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
