//! Donations attributed to email blasts
//!
//! The CRM tags a donation with the blast that brought it in. Joining
//! `tag` → `tag_data` → `email_blast` → `donation` on those tags yields one
//! row per attributed donation.

use crate::api::records::BlastDonation;
use crate::api::{Api, Criteria};
use crate::dates::SalsaTimestamp;
use crate::error::Result;
use crate::output::CsvWriter;
use crate::pipeline::{spawn_fetch, FetchOptions, PipelineStats, TableSource, TaskGroup};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Default report file
pub const DEFAULT_OUTPUT: &str = "blast_donation_report.csv";

/// Join from blast tags to donations
pub const BLAST_DONATION_JOIN: &str = concat!(
    "tag(tag_KEY)tag_data(tag.tag=email_blast_KEY)",
    "email_blast(tag_data.table_KEY=donation_KEY)donation"
);

/// Report columns
pub const HEADERS: [&str; 8] = [
    "EmailBlastKey",
    "DateRequested",
    "Subject",
    "Count",
    "Min",
    "Max",
    "Avg",
    "Sum",
];

/// Donation tags on email blasts, for successful or pending donations
pub fn base_criteria() -> Criteria {
    Criteria::new()
        .and("tag_data.database_table_KEY=45")
        .and("tag.prefix=email_blast")
        .and("donation.RESULT IN (0,-1)")
}

/// Donation totals for one blast
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlastStats {
    pub email_blast_key: String,
    pub date_requested: SalsaTimestamp,
    pub subject: String,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
}

impl BlastStats {
    fn new(row: &BlastDonation) -> Self {
        Self {
            email_blast_key: row.email_blast_key.clone(),
            date_requested: row.date_requested,
            subject: row.subject.clone(),
            ..Default::default()
        }
    }

    /// Fold one donation amount in
    pub fn add(&mut self, amount: f64) {
        self.count += 1;
        self.sum += amount;
        self.min = Some(self.min.map_or(amount, |m| m.min(amount)));
        self.max = Some(self.max.map_or(amount, |m| m.max(amount)));
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// One report row
    pub fn row(&self) -> Vec<String> {
        let date = self
            .date_requested
            .time()
            .map(|t| t.format(crate::dates::DATE_FORMAT).to_string())
            .unwrap_or_default();
        vec![
            self.email_blast_key.clone(),
            date,
            self.subject.clone(),
            self.count.to_string(),
            format!("{:.2}", self.min.unwrap_or_default()),
            format!("{:.2}", self.max.unwrap_or_default()),
            format!("{:.2}", self.avg()),
            format!("{:.2}", self.sum),
        ]
    }
}

/// Totals per blast, in blast key order
#[derive(Debug, Clone, Default)]
pub struct BlastTotals {
    blasts: BTreeMap<(u64, String), BlastStats>,
}

impl BlastTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attributed donation. Unparseable amounts count as zero.
    pub fn add(&mut self, row: &BlastDonation) {
        let amount = match row.amount.trim().parse::<f64>() {
            Ok(a) => a,
            Err(_) => {
                warn!(blast = %row.email_blast_key, amount = %row.amount, "Unreadable amount");
                0.0
            }
        };
        let order = row.email_blast_key.parse::<u64>().unwrap_or(u64::MAX);
        self.blasts
            .entry((order, row.email_blast_key.clone()))
            .or_insert_with(|| BlastStats::new(row))
            .add(amount);
    }

    pub fn len(&self) -> usize {
        self.blasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blasts.is_empty()
    }

    pub fn stats(&self) -> impl Iterator<Item = &BlastStats> {
        self.blasts.values()
    }
}

/// Outcome of the blast donation report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlastReport {
    pub donations: u64,
    pub blasts: u64,
    pub output: String,
}

/// Read attributed donations, total them per blast and write the CSV
pub async fn run(
    api: &Api,
    extra: &Criteria,
    fetch: FetchOptions,
    output: &Path,
) -> Result<BlastReport> {
    let mut criteria = base_criteria();
    for clause in extra.clauses() {
        criteria = criteria.and(clause.clone());
    }
    info!(%criteria, output = %output.display(), "Blast donation report starting");

    let stats = Arc::new(PipelineStats::new());
    let mut group = TaskGroup::new();
    let source =
        TableSource::<BlastDonation>::left_join(api.table(BLAST_DONATION_JOIN), criteria);
    let mut rows = spawn_fetch(&mut group, Arc::new(source), fetch, Arc::clone(&stats));

    let totals = group
        .drive(async move {
            let mut totals = BlastTotals::new();
            while let Some(row) = rows.recv().await {
                totals.add(&row);
            }
            Ok(totals)
        })
        .await?;

    let mut csv = CsvWriter::create(output, HEADERS.iter().map(ToString::to_string).collect())?;
    for blast in totals.stats() {
        csv.write_row(&blast.row())?;
    }
    csv.finish()?;

    let report = BlastReport {
        donations: stats.snapshot().records,
        blasts: totals.len() as u64,
        output: output.display().to_string(),
    };
    info!(?report, "Blast donation report done");
    Ok(report)
}
