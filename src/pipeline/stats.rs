//! Shared pipeline counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every stage of a pipeline
#[derive(Debug, Default)]
pub struct PipelineStats {
    pages: AtomicU64,
    records: AtomicU64,
    skipped_pages: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_page(&self, records: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(records as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_skipped_page(&self) {
        self.skipped_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages: self.pages.load(Ordering::SeqCst),
            records: self.records.load(Ordering::SeqCst),
            skipped_pages: self.skipped_pages.load(Ordering::SeqCst),
            processed: self.processed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Counter values at one moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Non-empty and empty pages read
    pub pages: u64,
    /// Records read
    pub records: u64,
    /// Offsets dropped because they were past the end of data
    pub skipped_pages: u64,
    /// Items handled by worker pools
    pub processed: u64,
    /// Items whose handler failed
    pub failed: u64,
}
