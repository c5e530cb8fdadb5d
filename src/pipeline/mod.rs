//! Paged-read pipelines
//!
//! Every job is built from the same pieces:
//!
//! - `spawn_fetch`: offset producer plus N page fetchers feeding a bounded
//!   record channel
//! - `spawn_workers` / `spawn_batches`: pools that consume a channel
//! - `TaskGroup`: runs the stages, fails fast on the first error
//!
//! Stages stop when their input channel closes. There are no sentinel
//! messages to count.

mod fetch;
mod group;
mod source;
mod stats;
mod workers;

pub use fetch::{read_all, spawn_fetch, FetchOptions};
pub use group::TaskGroup;
pub use source::{PageSource, TableSource};
pub use stats::{PipelineStats, StatsSnapshot};
pub use workers::{spawn_batches, spawn_workers};

#[cfg(test)]
mod tests;
