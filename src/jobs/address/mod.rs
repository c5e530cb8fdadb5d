//! Address fixer
//!
//! ```text
//! supporters --> fixer x N --changed--> finisher (save_bulk in chunks)
//!                    \
//!                     +--modifications--> auditor (log, optional CSV)
//! ```
//!
//! Without `live` the finisher only logs what it would save.

mod country;
mod fixer;
mod lookup;
mod postal;

pub use country::{fold_lookup_code, normalize as normalize_country, CountryMatch};
pub use fixer::{AddressFixer, Fixed, Modification};
pub use lookup::{Place, PostalResult, RestCountries, Zippopotamus};
pub use postal::PostalKind;

use crate::api::records::Supporter;
use crate::api::{Api, Criteria, SaveRequest};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::CsvWriter;
use crate::pipeline::{
    spawn_batches, spawn_fetch, spawn_workers, FetchOptions, PipelineStats, TableSource,
    TaskGroup,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Default supporters per `/save` request
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Build the fixer with lookup clients from `config`
pub fn fixer_from_config(config: &Config) -> Result<AddressFixer> {
    let lookups = &config.lookups;
    let postal = Zippopotamus::new(config.http.client_config(&lookups.zippopotamus_url))?;
    let countries = RestCountries::new(config.http.client_config(&lookups.restcountries_url))?;
    Ok(AddressFixer::new(
        postal,
        countries,
        lookups.default_country.clone(),
    ))
}

/// How to run the address fixer
#[derive(Debug, Clone)]
pub struct AddressFixerOptions {
    /// Which supporters to read
    pub criteria: Criteria,
    pub fetch: FetchOptions,
    /// Concurrent fixers
    pub fixers: usize,
    /// Supporters per save request
    pub chunk_size: usize,
    /// Write changes back to the CRM
    pub live: bool,
    /// Also write every modification to this CSV file
    pub audit_path: Option<PathBuf>,
}

impl Default for AddressFixerOptions {
    fn default() -> Self {
        Self {
            criteria: Criteria::new(),
            fetch: FetchOptions::default(),
            fixers: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            live: false,
            audit_path: None,
        }
    }
}

/// What the address fixer did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressFixReport {
    /// Supporters read
    pub supporters: u64,
    /// Supporters with at least one modification
    pub changed: u64,
    pub modifications: u64,
    /// Supporters without a key, never fixed or saved
    pub skipped: u64,
    /// Supporters written back (always 0 on a dry run)
    pub saved: u64,
    pub live: bool,
}

/// Read supporters, fix their addresses and save the changed ones
pub async fn run(
    api: &Api,
    fixer: AddressFixer,
    options: AddressFixerOptions,
) -> Result<AddressFixReport> {
    info!(
        criteria = %options.criteria,
        fixers = options.fixers,
        chunk_size = options.chunk_size,
        live = options.live,
        "Address fixer starting"
    );

    let stats = Arc::new(PipelineStats::new());
    let changed = Arc::new(AtomicU64::new(0));
    let saved = Arc::new(AtomicU64::new(0));
    let skipped = Arc::new(AtomicU64::new(0));
    let mut group = TaskGroup::new();

    let source = Arc::new(TableSource::<Supporter>::objects(
        api.supporter(),
        options.criteria.clone(),
    ));
    let supporters = spawn_fetch(&mut group, source, options.fetch, Arc::clone(&stats));

    let buffer = options.fetch.buffer.max(1);
    let (audit_tx, mut audit_rx) = mpsc::channel::<Modification>(buffer);
    let (save_tx, save_rx) = mpsc::channel::<Supporter>(buffer);

    let fixer = Arc::new(fixer);
    {
        let changed = Arc::clone(&changed);
        let skipped = Arc::clone(&skipped);
        spawn_workers(
            &mut group,
            "fixer",
            options.fixers,
            supporters,
            Arc::clone(&stats),
            move |supporter: Supporter| {
                let fixer = Arc::clone(&fixer);
                let audit_tx = audit_tx.clone();
                let save_tx = save_tx.clone();
                let changed = Arc::clone(&changed);
                let skipped = Arc::clone(&skipped);
                async move {
                    if supporter.key.trim().is_empty() {
                        warn!(email = %supporter.email, "Supporter without a key, skipping");
                        skipped.fetch_add(1, Ordering::Relaxed);
                        return Ok(());
                    }
                    let fixed = fixer.fix(supporter).await?;
                    if !fixed.is_changed() {
                        return Ok(());
                    }
                    changed.fetch_add(1, Ordering::Relaxed);
                    for m in fixed.modifications {
                        audit_tx
                            .send(m)
                            .await
                            .map_err(|_| Error::pipeline("fixer", "auditor stopped"))?;
                    }
                    save_tx
                        .send(fixed.supporter)
                        .await
                        .map_err(|_| Error::pipeline("fixer", "finisher stopped"))
                }
            },
        );
    }

    {
        let table = api.supporter();
        let saved = Arc::clone(&saved);
        let live = options.live;
        spawn_batches(
            &mut group,
            "finisher",
            options.chunk_size,
            save_rx,
            Arc::new(PipelineStats::new()),
            move |chunk: Vec<Supporter>| {
                let table = table.clone();
                let saved = Arc::clone(&saved);
                async move {
                    if !live {
                        info!(supporters = chunk.len(), "Dry run, not saving");
                        return Ok(());
                    }
                    let requests: Vec<SaveRequest> = chunk
                        .iter()
                        .map(|s| SaveRequest {
                            key: s.key.clone(),
                            fields: s.address_fields(),
                        })
                        .collect();
                    table.save_bulk(&requests).await?;
                    saved.fetch_add(requests.len() as u64, Ordering::Relaxed);
                    info!(supporters = requests.len(), "Saved");
                    Ok(())
                }
            },
        );
    }

    let audit_path = options.audit_path.clone();
    let modifications = group
        .drive(async move {
            let headers = Modification::HEADERS.iter().map(ToString::to_string).collect();
            let mut audit = audit_path
                .as_ref()
                .map(|path| CsvWriter::create(path, headers))
                .transpose()?;
            let mut count = 0u64;
            while let Some(m) = audit_rx.recv().await {
                info!("Audit: {m}");
                if let Some(writer) = audit.as_mut() {
                    writer.write_row(&m.row())?;
                }
                count += 1;
            }
            if let Some(writer) = audit {
                writer.finish()?;
            }
            Ok(count)
        })
        .await?;

    let report = AddressFixReport {
        supporters: stats.snapshot().records,
        changed: changed.load(Ordering::Relaxed),
        modifications,
        skipped: skipped.load(Ordering::Relaxed),
        saved: saved.load(Ordering::Relaxed),
        live: options.live,
    };
    info!(?report, "Address fixer done");
    Ok(report)
}
