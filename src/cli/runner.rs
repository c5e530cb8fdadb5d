//! CLI runner - executes commands

use crate::api::{Api, Criteria};
use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat, TableArgs, WindowArgs};
use crate::config::Config;
use crate::dates::parse_day;
use crate::error::{Error, Result};
use crate::jobs::{self, address, blast_report, cleanup, email_stats, export, overlap};
use crate::output::{OutputFormat as FileFormat, ParquetWriterConfig};
use crate::pagination::MAX_PAGE_SIZE;
use crate::pipeline::{spawn_fetch, FetchOptions, PipelineStats, TableSource, TaskGroup};
use crate::store::StatsStore;
use crate::types::{ReadMode, Record};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its result
    pub async fn run(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.execute().await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Command done");
        self.output_message(&result);
        Ok(())
    }

    /// Run the CLI command and return its result
    pub async fn execute(&self) -> Result<Value> {
        let config = self.load_config()?;
        let api = Api::connect(&config).await?;

        match &self.cli.command {
            Commands::Count { target } => {
                let table = api.table(target.table.clone());
                let criteria = criteria(&target.conditions);
                let count = table.count(&criteria).await?;
                Ok(json!({ "table": table.name(), "count": count }))
            }

            Commands::Describe { table } => {
                let fields = api.table(table.clone()).describe().await?;
                to_value(&fields)
            }

            Commands::Query {
                target,
                key,
                offset,
                limit,
            } => {
                let table = api.table(target.table.clone());
                if let Some(key) = key {
                    return Ok(Value::Object(table.one_map(key).await?));
                }
                let records: Vec<Record> = table
                    .read(mode(target), *offset, *limit, &criteria(&target.conditions))
                    .await?;
                Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
            }

            Commands::List { target, fetch } => {
                let fetch = fetch_options(&config, fetch)?;
                self.list(&api, target, fetch).await
            }

            Commands::Save {
                table,
                key,
                fields,
                live,
            } => {
                let fields = fields
                    .iter()
                    .map(|f| parse_assignment(f))
                    .collect::<Result<Vec<_>>>()?;
                if !*live {
                    info!(%table, %key, "Dry run, not saving");
                    return Ok(json!({
                        "table": table,
                        "key": key,
                        "fields": fields
                            .iter()
                            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                            .collect::<serde_json::Map<_, _>>(),
                        "live": false
                    }));
                }
                let results = api.table(table.clone()).save(key, &fields).await?;
                to_value(&results)
            }

            Commands::Delete { table, key, live } => {
                if !*live {
                    info!(%table, %key, "Dry run, not deleting");
                    return Ok(json!({ "table": table, "key": key, "live": false }));
                }
                let result = api.table(table.clone()).delete(key).await?;
                to_value(&result)
            }

            Commands::AddressFixer {
                conditions,
                fetch,
                fixers,
                chunk_size,
                audit,
                live,
            } => {
                let options = jobs::AddressFixerOptions {
                    criteria: criteria(conditions),
                    fetch: fetch_options(&config, fetch)?,
                    fixers: *fixers,
                    chunk_size: *chunk_size,
                    live: *live,
                    audit_path: audit.clone(),
                };
                let fixer = address::fixer_from_config(&config)?;
                to_value(&address::run(&api, fixer, options).await?)
            }

            Commands::DeleteDonations {
                window,
                fetch,
                deleters,
                live,
            } => {
                let (start, end) = window_days(window)?;
                let options = delete_options(&config, fetch, *deleters, *live)?;
                to_value(&cleanup::delete_donations(&api, start, end, options).await?)
            }

            Commands::DeleteSupporterGroups {
                conditions,
                fetch,
                deleters,
                live,
            } => {
                let options = delete_options(&config, fetch, *deleters, *live)?;
                let report =
                    cleanup::purge(&api, "supporter_groups", criteria(conditions), options).await?;
                to_value(&report)
            }

            Commands::DeleteGroups {
                conditions,
                fetch,
                deleters,
                live,
            } => {
                let options = delete_options(&config, fetch, *deleters, *live)?;
                to_value(&cleanup::purge(&api, "groups", criteria(conditions), options).await?)
            }

            Commands::EmailYearStats {
                start,
                database,
                fetch,
            } => {
                let store = match database {
                    Some(path) => StatsStore::open(path)?,
                    None => StatsStore::open_in_memory()?,
                };
                let fetch = fetch_options(&config, fetch)?.starting_at(*start);
                to_value(&email_stats::run(&api, &store, fetch).await?)
            }

            Commands::BlastDonationReport {
                conditions,
                output,
                fetch,
            } => {
                let fetch = fetch_options(&config, fetch)?;
                let report = blast_report::run(&api, &criteria(conditions), fetch, output).await?;
                to_value(&report)
            }

            Commands::Export {
                target,
                fields,
                output,
                file_format,
                compression,
                fetch,
            } => {
                let options = jobs::ExportOptions {
                    table: target.table.clone(),
                    criteria: criteria(&target.conditions),
                    mode: mode(target),
                    fields: fields.clone(),
                    format: export_format(output, file_format.as_deref())?,
                    output: output.clone(),
                    parquet: compression.parse::<ParquetWriterConfig>()?,
                    fetch: fetch_options(&config, fetch)?,
                };
                to_value(&export::run(&api, options).await?)
            }

            Commands::GroupOverlap {
                include,
                exclude,
                window,
                directory,
            } => {
                let (start, end) = window_days(window)?;
                let options = jobs::OverlapOptions {
                    included: include.clone(),
                    excluded: exclude.clone(),
                    start,
                    end,
                    directory: directory.clone(),
                    page_size: config.pipeline.page_size,
                };
                to_value(&overlap::run(&api, options).await?)
            }
        }
    }

    /// Load configuration from `--config`, or from the environment
    fn load_config(&self) -> Result<Config> {
        match &self.cli.config {
            Some(path) => Config::from_file(path),
            None => Config::from_env(),
        }
    }

    /// Print every matching record as it arrives
    async fn list(&self, api: &Api, target: &TableArgs, fetch: FetchOptions) -> Result<Value> {
        let table = api.table(target.table.clone());
        let criteria = criteria(&target.conditions);
        let source = match mode(target) {
            ReadMode::Objects => TableSource::<Record>::objects(table, criteria).counted(true),
            ReadMode::LeftJoin => TableSource::<Record>::left_join(table, criteria),
        };

        let stats = Arc::new(PipelineStats::new());
        let mut group = TaskGroup::new();
        let mut records = spawn_fetch(&mut group, Arc::new(source), fetch, Arc::clone(&stats));
        group
            .drive(async move {
                while let Some(record) = records.recv().await {
                    self.output_message(&Value::Object(record));
                }
                Ok(())
            })
            .await?;

        Ok(json!({ "table": target.table, "stats": stats.snapshot() }))
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn criteria(conditions: &[String]) -> Criteria {
    conditions
        .iter()
        .fold(Criteria::new(), |criteria, c| criteria.and(c.clone()))
}

fn mode(target: &TableArgs) -> ReadMode {
    if target.join {
        ReadMode::LeftJoin
    } else {
        ReadMode::Objects
    }
}

/// Pipeline sizing from config, with command-line overrides
pub(crate) fn fetch_options(config: &Config, args: &FetchArgs) -> Result<FetchOptions> {
    let mut options = FetchOptions::from(&config.pipeline);
    if let Some(page_size) = args.page_size {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_value(
                "page-size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
            ));
        }
        options.page_size = page_size;
    }
    if let Some(fetchers) = args.fetchers {
        if fetchers == 0 {
            return Err(Error::invalid_value("fetchers", "must be at least 1"));
        }
        options = options.fetchers(fetchers);
    }
    Ok(options)
}

fn delete_options(
    config: &Config,
    fetch: &FetchArgs,
    deleters: usize,
    live: bool,
) -> Result<jobs::DeleteOptions> {
    if deleters == 0 {
        return Err(Error::invalid_value("deleters", "must be at least 1"));
    }
    Ok(jobs::DeleteOptions {
        fetch: fetch_options(config, fetch)?,
        deleters,
        live,
    })
}

fn window_days(window: &WindowArgs) -> Result<(NaiveDate, NaiveDate)> {
    Ok((parse_day(&window.start)?, parse_day(&window.end)?))
}

/// File format named on the command line, or else implied by the extension
pub(crate) fn export_format(output: &Path, explicit: Option<&str>) -> Result<FileFormat> {
    if let Some(name) = explicit {
        return name.parse();
    }
    FileFormat::from_path(output).ok_or_else(|| {
        Error::invalid_value(
            "output",
            format!(
                "cannot tell the format of '{}', use .csv, .parquet or --file-format",
                output.display()
            ),
        )
    })
}

/// Split `Field=value`
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::invalid_value("set", format!("'{raw}' is not Field=value")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_value("set", format!("'{raw}' has no field name")));
    }
    Ok((name.to_string(), value.to_string()))
}
