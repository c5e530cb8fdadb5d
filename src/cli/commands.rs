//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Salsa Classic CRM client and batch jobs
#[derive(Parser, Debug)]
#[command(name = "salsadig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML). Without one, `SALSA_*` variables are used.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Records to read: a table or join plus conditions
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Table name, or a join expression with --join
    pub table: String,

    /// Condition clause, repeatable (`Last_Modified>2021-01-01`)
    #[arg(long = "condition", short = 'w')]
    pub conditions: Vec<String>,

    /// Read through getLeftJoin.sjs
    #[arg(long)]
    pub join: bool,
}

/// Pipeline sizing overrides
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Records per page (at most 500)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Concurrent page fetchers
    #[arg(long)]
    pub fetchers: Option<usize>,
}

/// A `[start, end)` window of `YYYY-MM-DD` days
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// First day, inclusive
    #[arg(long)]
    pub start: String,

    /// Last day, exclusive
    #[arg(long)]
    pub end: String,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count records matching the conditions
    Count {
        #[command(flatten)]
        target: TableArgs,
    },

    /// Describe a table's columns
    Describe {
        /// Table name
        table: String,
    },

    /// Read one page of records, or one record by key
    Query {
        #[command(flatten)]
        target: TableArgs,

        /// Read the single record with this key
        #[arg(long, conflicts_with_all = ["join", "conditions"])]
        key: Option<String>,

        /// First offset
        #[arg(long, default_value = "0")]
        offset: u32,

        /// Records to read (at most 500)
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Stream every matching record
    List {
        #[command(flatten)]
        target: TableArgs,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Save fields on a record (key 0 creates one)
    Save {
        /// Table name
        table: String,

        /// Record key
        #[arg(long, default_value = "0")]
        key: String,

        /// Field to set, repeatable (`Field=value`)
        #[arg(long = "set", short = 's', required = true)]
        fields: Vec<String>,

        /// Write to the CRM; otherwise only print the request
        #[arg(long)]
        live: bool,
    },

    /// Delete one record
    Delete {
        /// Table name
        table: String,

        /// Record key
        #[arg(long)]
        key: String,

        /// Delete in the CRM; otherwise only print the request
        #[arg(long)]
        live: bool,
    },

    /// Correct supporter countries, states and postal codes
    AddressFixer {
        /// Condition clause on supporters, repeatable
        #[arg(long = "condition", short = 'w')]
        conditions: Vec<String>,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Concurrent fixers
        #[arg(long, default_value = "1")]
        fixers: usize,

        /// Supporters per save request
        #[arg(long, default_value = "50")]
        chunk_size: usize,

        /// Also write every modification to this CSV file
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Save changes to the CRM
        #[arg(long)]
        live: bool,
    },

    /// Delete donations modified in a window, and their supporters
    DeleteDonations {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Concurrent deleters per table
        #[arg(long, default_value = "5")]
        deleters: usize,

        /// Delete in the CRM
        #[arg(long)]
        live: bool,
    },

    /// Delete supporter_groups records
    DeleteSupporterGroups {
        /// Condition clause, repeatable
        #[arg(long = "condition", short = 'w')]
        conditions: Vec<String>,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Concurrent deleters
        #[arg(long, default_value = "5")]
        deleters: usize,

        /// Delete in the CRM
        #[arg(long)]
        live: bool,
    },

    /// Delete groups records
    DeleteGroups {
        /// Condition clause, repeatable
        #[arg(long = "condition", short = 'w')]
        conditions: Vec<String>,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Concurrent deleters
        #[arg(long, default_value = "5")]
        deleters: usize,

        /// Delete in the CRM
        #[arg(long)]
        live: bool,
    },

    /// Emails sent per year and status
    EmailYearStats {
        /// First offset to read
        #[arg(long, default_value = "0")]
        start: u32,

        /// DuckDB file to keep rows in (in memory when omitted)
        #[arg(long)]
        database: Option<PathBuf>,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Donation totals per email blast
    BlastDonationReport {
        /// Extra condition clause, repeatable
        #[arg(long = "condition", short = 'w')]
        conditions: Vec<String>,

        /// Report file
        #[arg(short, long, default_value = crate::jobs::blast_report::DEFAULT_OUTPUT)]
        output: PathBuf,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Export a table or join to CSV or Parquet
    Export {
        #[command(flatten)]
        target: TableArgs,

        /// Columns to write, comma-separated (default: every described column)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Output file ending in `.csv` or `.parquet`
        #[arg(short, long)]
        output: PathBuf,

        /// File format (csv, parquet) when the extension does not say
        #[arg(long)]
        file_format: Option<String>,

        /// Parquet compression (snappy, zstd, none)
        #[arg(long, default_value = "snappy")]
        compression: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Supporters shared between groups that joined in a window
    GroupOverlap {
        /// Group keys to compare, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        include: Vec<u64>,

        /// Group keys whose members are left out, comma-separated
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<u64>,

        #[command(flatten)]
        window: WindowArgs,

        /// Directory for summary.csv and the member lists
        #[arg(long, default_value = crate::jobs::overlap::DEFAULT_DIRECTORY)]
        directory: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
