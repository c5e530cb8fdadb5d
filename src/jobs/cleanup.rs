//! Deleting records in bulk
//!
//! Keys are read in full before the first delete, so deleting never shifts
//! the offsets of pages still to be read.

use crate::api::records::Donation;
use crate::api::{Api, Criteria, Table};
use crate::error::{Error, Result};
use crate::pipeline::{
    spawn_fetch, spawn_workers, FetchOptions, PipelineStats, TableSource, TaskGroup,
};
use crate::types::{Record, RecordExt};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Sizing and safety switch shared by the delete jobs
#[derive(Debug, Clone, Copy)]
pub struct DeleteOptions {
    pub fetch: FetchOptions,
    /// Concurrent deleters per table
    pub deleters: usize,
    /// Really delete; otherwise only log
    pub live: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            deleters: 5,
            live: false,
        }
    }
}

/// Keys found and deleted in one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteCount {
    pub table: String,
    pub found: u64,
    pub deleted: u64,
}

/// Outcome of a delete job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub tables: Vec<DeleteCount>,
    pub live: bool,
}

/// Delete `keys` from `table` with a pool of deleters
///
/// Returns the counter the deleters bump. It stays at zero on a dry run.
fn spawn_deleters(
    group: &mut TaskGroup,
    table: Table,
    keys: Vec<String>,
    options: &DeleteOptions,
) -> Arc<AtomicU64> {
    let deleted = Arc::new(AtomicU64::new(0));
    let (tx, rx) = mpsc::channel::<String>(options.fetch.buffer.max(1));
    let stage = format!("{}-deleter", table.name());

    group.spawn(format!("{}-keys", table.name()), async move {
        for key in keys {
            if tx.send(key).await.is_err() {
                break;
            }
        }
        Ok(())
    });

    let live = options.live;
    let counter = Arc::clone(&deleted);
    spawn_workers(
        group,
        &stage,
        options.deleters,
        rx,
        Arc::new(PipelineStats::new()),
        move |key: String| {
            let table = table.clone();
            let counter = Arc::clone(&counter);
            async move {
                if live {
                    table.delete(&key).await?;
                    counter.fetch_add(1, Ordering::Relaxed);
                    debug!(table = %table.name(), %key, "Deleted");
                } else {
                    debug!(table = %table.name(), %key, "Dry run, not deleting");
                }
                Ok(())
            }
        },
    );
    deleted
}

/// Read every record of `source` concurrently
async fn collect<T: serde::de::DeserializeOwned + Send + 'static>(
    source: TableSource<T>,
    fetch: FetchOptions,
) -> Result<Vec<T>> {
    let mut group = TaskGroup::new();
    let mut rx = spawn_fetch(
        &mut group,
        Arc::new(source.counted(true)),
        fetch,
        Arc::new(PipelineStats::new()),
    );
    group
        .drive(async move {
            let mut all = Vec::new();
            while let Some(item) = rx.recv().await {
                all.push(item);
            }
            Ok(all)
        })
        .await
}

/// Criteria for `Last_Modified` in `[start, end)`
pub fn modified_between(start: NaiveDate, end: NaiveDate) -> Result<Criteria> {
    if end <= start {
        return Err(Error::invalid_value(
            "end",
            format!("{end} must be after start {start}"),
        ));
    }
    Ok(Criteria::new()
        .and(format!("Last_Modified>={start}"))
        .and(format!("Last_Modified<{end}")))
}

/// Delete donations modified in `[start, end)` and the supporters who made
/// them
pub async fn delete_donations(
    api: &Api,
    start: NaiveDate,
    end: NaiveDate,
    options: DeleteOptions,
) -> Result<DeleteReport> {
    let criteria = modified_between(start, end)?;
    info!(%criteria, live = options.live, "Reading donations to delete");

    let donations: Vec<Donation> =
        collect(TableSource::objects(api.donation(), criteria), options.fetch).await?;
    let donation_keys: Vec<String> = donations
        .iter()
        .map(|d| d.key.clone())
        .filter(|k| !k.is_empty())
        .collect();
    let supporter_keys: Vec<String> = donations
        .iter()
        .map(|d| d.supporter_key.clone())
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    info!(
        donations = donation_keys.len(),
        supporters = supporter_keys.len(),
        "Deleting"
    );

    let mut tables = vec![
        DeleteCount {
            table: "donation".into(),
            found: donation_keys.len() as u64,
            deleted: 0,
        },
        DeleteCount {
            table: "supporter".into(),
            found: supporter_keys.len() as u64,
            deleted: 0,
        },
    ];

    let mut group = TaskGroup::new();
    let donations_deleted = spawn_deleters(&mut group, api.donation(), donation_keys, &options);
    let supporters_deleted =
        spawn_deleters(&mut group, api.supporter(), supporter_keys, &options);
    group.join().await?;

    tables[0].deleted = donations_deleted.load(Ordering::Relaxed);
    tables[1].deleted = supporters_deleted.load(Ordering::Relaxed);
    let report = DeleteReport {
        tables,
        live: options.live,
    };
    info!(?report, "Delete donations done");
    Ok(report)
}

/// Delete every record of `table` that matches `criteria`
pub async fn purge(
    api: &Api,
    table: &str,
    criteria: Criteria,
    options: DeleteOptions,
) -> Result<DeleteReport> {
    let table = api.table(table);
    let key_field = table.key_field();
    info!(table = %table.name(), %criteria, live = options.live, "Reading keys to delete");

    let records: Vec<Record> =
        collect(TableSource::objects(table.clone(), criteria), options.fetch).await?;
    let keys: Vec<String> = records
        .iter()
        .map(|r| r.text(&key_field))
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found = keys.len() as u64;
    info!(table = %table.name(), keys = found, "Deleting");

    let mut group = TaskGroup::new();
    let deleted = spawn_deleters(&mut group, table.clone(), keys, &options);
    group.join().await?;

    let report = DeleteReport {
        tables: vec![DeleteCount {
            table: table.name().to_string(),
            found,
            deleted: deleted.load(Ordering::Relaxed),
        }],
        live: options.live,
    };
    info!(?report, "Purge done");
    Ok(report)
}
