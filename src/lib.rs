// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # salsadig
//!
//! A client for the Salsa Classic CRM HTTP/JSON API, and the batch jobs
//! built on it.
//!
//! ## Features
//!
//! - **Table client**: `one`, `many`, `left_join`, `count`, `describe`,
//!   `save` and `delete` on any CRM table, typed or untyped
//! - **Session auth**: campaign manager login with cookie replay
//! - **Concurrent paged reads**: offset producer, N page fetchers, fail-fast
//!   task groups
//! - **Jobs**: address fixing, bulk deletes, email statistics, blast donation
//!   attribution, exports and group overlap
//! - **Outputs**: CSV, Parquet and DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salsadig::{api::Api, config::Config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("salsa.yaml")?;
//!     let api = Api::connect(&config).await?;
//!
//!     let count = api.supporter().count(&"Zip=78757".into()).await?;
//!     println!("{count} supporters");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CLI (salsadig)                           │
//! │  count  describe  query  list  save  delete  <jobs>             │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Jobs   │ Pipeline  │   Analysis    │   Store   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Address  │ Fetch     │ Census        │ DuckDB    │ CSV         │
//! │ Cleanup  │ Workers   │ Overlap       │           │ Parquet     │
//! │ Reports  │ TaskGroup │               │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┐
//! │   API    │   HTTP    │  Pagination   │
//! ├──────────┼───────────┼───────────────┤
//! │ Table    │ GET/POST  │ Offset/count  │
//! │ Records  │ Session   │ Stop rules    │
//! │ Criteria │ Rate Limit│               │
//! └──────────┴───────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Campaign manager session login
pub mod auth;

/// HTTP client with session cookies and rate limiting
pub mod http;

/// Offset/count pagination
pub mod pagination;

/// CRM timestamps and dates
pub mod dates;

/// Table client and typed records
pub mod api;

/// Configuration
pub mod config;

/// Concurrent fetch and worker stages
pub mod pipeline;

/// CSV and Parquet output
pub mod output;

/// DuckDB statistics store
pub mod store;

/// Group membership analysis
pub mod analysis;

/// Batch jobs
pub mod jobs;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{Api, Criteria, Table};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
