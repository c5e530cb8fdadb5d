//! Yearly email statistics
//!
//! Reads the whole `email` table and keeps `(year, supporter_KEY, status)`
//! per sent email in DuckDB, then summarizes by year and status.

use crate::api::records::Email;
use crate::api::{Api, Criteria};
use crate::error::{Error, Result};
use crate::pipeline::{spawn_fetch, FetchOptions, PipelineStats, TableSource, TaskGroup};
use crate::store::{EmailStat, StatsStore, YearStatus};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Rows buffered per insert
const INSERT_BATCH: usize = 1000;

/// Outcome of the email statistics job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailStatsReport {
    /// Emails read
    pub emails: u64,
    /// Rows written to the store
    pub stored: u64,
    /// Emails without a send time
    pub unsent: u64,
    pub summary: Vec<YearStatus>,
}

/// Year an email went out, from the fourth word of `Time_Sent`
///
/// `Wed Aug 01 2018 11:30:51 GMT-0400 (EDT)` is 2018. An empty value means
/// the email was never sent.
pub fn sent_year(time_sent: &str) -> Result<Option<i32>> {
    let time_sent = time_sent.trim();
    if time_sent.is_empty() {
        return Ok(None);
    }
    let word = time_sent.split_whitespace().nth(3).unwrap_or_default();
    word.parse::<i32>()
        .map(Some)
        .map_err(|e| Error::decode(format!("{e} on '{word}' in Time_Sent '{time_sent}'")))
}

/// Read emails starting at `fetch.start` into `store` and summarize
pub async fn run(api: &Api, store: &StatsStore, fetch: FetchOptions) -> Result<EmailStatsReport> {
    info!(start = fetch.start, store = %store.location(), "Email stats starting");
    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let source = TableSource::<Email>::objects(api.email(), Criteria::new()).counted(true);
    let mut emails = spawn_fetch(&mut group, Arc::new(source), fetch, Arc::clone(&stats));

    let (stored, unsent) = group
        .drive(async move {
            let mut batch = Vec::with_capacity(INSERT_BATCH);
            let (mut stored, mut unsent) = (0u64, 0u64);
            while let Some(email) = emails.recv().await {
                let Some(year) = sent_year(&email.time_sent)? else {
                    unsent += 1;
                    continue;
                };
                batch.push(EmailStat {
                    year,
                    supporter_key: email.supporter_key.trim().parse().ok(),
                    status: email.status,
                });
                if batch.len() == INSERT_BATCH {
                    stored += store.insert_email_stats(&batch)? as u64;
                    batch.clear();
                }
            }
            stored += store.insert_email_stats(&batch)? as u64;
            Ok((stored, unsent))
        })
        .await?;

    let report = EmailStatsReport {
        emails: stats.snapshot().records,
        stored,
        unsent,
        summary: store.year_summary()?,
    };
    info!(
        emails = report.emails,
        stored = report.stored,
        unsent = report.unsent,
        "Email stats done"
    );
    Ok(report)
}
