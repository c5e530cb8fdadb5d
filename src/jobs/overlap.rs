//! Group overlap
//!
//! Finds supporters who joined two groups in a date window, leaving out
//! anyone in a set of excluded groups. Writes `summary.csv` with one line per
//! non-empty pair plus a `supporter_KEY` list per pair: `{gk}.csv` for a
//! group by itself, `{gk1}-{gk2}.csv` for two groups.

use super::cleanup::modified_between;
use crate::analysis::{analyze, Census, Members, Overlap};
use crate::api::records::SupporterGroup;
use crate::api::{Api, Criteria};
use crate::error::{Error, Result, ResultExt};
use crate::output::CsvWriter;
use crate::pagination::StopCondition;
use crate::pipeline::{read_all, TableSource, TaskGroup};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Default output directory
pub const DEFAULT_DIRECTORY: &str = "./overlap_details";

/// Groups and window to analyze
#[derive(Debug, Clone)]
pub struct OverlapOptions {
    pub included: Vec<u64>,
    pub excluded: Vec<u64>,
    pub start: NaiveDate,
    /// Day after the last day of the window
    pub end: NaiveDate,
    pub directory: PathBuf,
    pub page_size: u32,
}

/// One line of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub groups_key1: u64,
    pub groups_key2: u64,
    pub overlap: usize,
}

/// Outcome of the overlap job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlapReport {
    pub included_members: usize,
    pub excluded_members: usize,
    pub pairs: Vec<PairCount>,
    pub directory: String,
}

/// Read the members of each of `keys` that joined in the window
pub async fn build_census(
    api: &Api,
    keys: &[u64],
    window: &Criteria,
    page_size: u32,
) -> Result<Census> {
    let mut census = Census::new(keys);
    let mut group = TaskGroup::new();
    let (tx, mut rx) = mpsc::channel::<(u64, Members)>(keys.len().max(1));

    for &key in keys {
        let source = TableSource::<SupporterGroup>::objects(
            api.supporter_groups(),
            window.clone().and(format!("groups_KEY={key}")),
        );
        let tx = tx.clone();
        group.spawn(format!("group-{key}"), async move {
            let rows = read_all(&source, page_size, StopCondition::EmptyPage).await?;
            let mut members = Members::new();
            for row in rows {
                match row.supporter_key.trim().parse::<u64>() {
                    Ok(k) => {
                        members.insert(k);
                    }
                    Err(_) => warn!(
                        group = key,
                        row = %row.key,
                        "supporter_groups row without supporter"
                    ),
                }
            }
            info!(group = key, members = members.len(), "Read group");
            tx.send((key, members))
                .await
                .map_err(|_| Error::pipeline("census", "receiver closed"))
        });
    }
    drop(tx);

    group
        .drive(async {
            while let Some((key, members)) = rx.recv().await {
                census.extend(key, members);
            }
            Ok(())
        })
        .await?;
    Ok(census)
}

fn pair_file(directory: &Path, gk1: u64, gk2: u64) -> PathBuf {
    let name = if gk1 == gk2 {
        format!("{gk1}.csv")
    } else {
        format!("{gk1}-{gk2}.csv")
    };
    directory.join(name)
}

/// Write `summary.csv` and one member list per pair
pub fn write_overlap(directory: &Path, overlap: &Overlap) -> Result<Vec<PairCount>> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating {}", directory.display()))?;
    let mut summary = CsvWriter::create(
        directory.join("summary.csv"),
        vec!["groups_KEY1".into(), "groups_KEY2".into(), "Overlap".into()],
    )?;

    let mut pairs = Vec::with_capacity(overlap.len());
    for (&(gk1, gk2), members) in overlap {
        let path = pair_file(directory, gk1, gk2);
        let mut list = CsvWriter::create(&path, vec!["supporter_KEY".into()])?;
        for key in members {
            list.write_row(&[key.to_string()])?;
        }
        list.finish()?;
        info!(
            pair = %format!("{gk1}-{gk2}"),
            members = members.len(),
            file = %path.display(),
            "Wrote members"
        );

        summary.write_row(&[gk1.to_string(), gk2.to_string(), members.len().to_string()])?;
        pairs.push(PairCount {
            groups_key1: gk1,
            groups_key2: gk2,
            overlap: members.len(),
        });
    }
    summary.finish()?;
    Ok(pairs)
}

/// Build both censuses, analyze and write the results
pub async fn run(api: &Api, options: OverlapOptions) -> Result<OverlapReport> {
    if options.included.is_empty() {
        return Err(Error::config("no groups to include"));
    }
    let window = modified_between(options.start, options.end)?;

    let included = build_census(api, &options.included, &window, options.page_size).await?;
    let excluded = build_census(api, &options.excluded, &window, options.page_size).await?;
    info!(
        included = included.memberships(),
        excluded = excluded.memberships(),
        "Census done"
    );

    let overlap = analyze(&included, &excluded);
    let pairs = write_overlap(&options.directory, &overlap)?;

    Ok(OverlapReport {
        included_members: included.memberships(),
        excluded_members: excluded.memberships(),
        pairs,
        directory: options.directory.display().to_string(),
    })
}
