//! Batch jobs
//!
//! Each job is composed from the `pipeline` stages and returns a serializable
//! report. Jobs that write to the CRM do nothing but log unless `live` is set.
//!
//! | Job | Reads | Writes |
//! |-----|-------|--------|
//! | `address` | supporter | supporter (`/save`) |
//! | `cleanup::delete_donations` | donation | donation, supporter (`/delete`) |
//! | `cleanup::purge` | any table | same table (`/delete`) |
//! | `email_stats` | email | DuckDB |
//! | `blast_report` | tag/email_blast/donation join | CSV |
//! | `export` | any table or join | CSV / Parquet |
//! | `overlap` | supporter_groups | CSV directory |

pub mod address;
pub mod blast_report;
pub mod cleanup;
pub mod email_stats;
pub mod export;
pub mod overlap;

pub use address::{AddressFixReport, AddressFixerOptions};
pub use blast_report::BlastReport;
pub use cleanup::{DeleteOptions, DeleteReport};
pub use email_stats::EmailStatsReport;
pub use export::{ExportOptions, ExportReport};
pub use overlap::{OverlapOptions, OverlapReport};
