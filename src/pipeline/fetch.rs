//! Concurrent paged reads
//!
//! ```text
//! producer --offsets--> fetcher x N --records--> receiver
//! ```
//!
//! The producer stops at the total when the source knows it. Otherwise it
//! keeps issuing offsets until some fetcher reads an empty page; offsets at
//! or past that point are dropped. The record channel closes when the last
//! fetcher exits.

use super::group::TaskGroup;
use super::source::PageSource;
use super::stats::PipelineStats;
use crate::config::PipelineSettings;
use crate::error::Result;
use crate::pagination::{
    clamp_page_size, OffsetPaginator, PageWindow, PaginationState, StopCondition,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Sizing for a fetch stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// First offset to read
    pub start: u32,
    /// Records per page
    pub page_size: u32,
    /// Concurrent fetchers
    pub fetchers: usize,
    /// Capacity of the record channel
    pub buffer: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&PipelineSettings::default())
    }
}

impl From<&PipelineSettings> for FetchOptions {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            start: 0,
            page_size: settings.page_size,
            fetchers: settings.fetchers,
            buffer: settings.buffer,
        }
    }
}

impl FetchOptions {
    /// Start reading at `offset`
    #[must_use]
    pub fn starting_at(mut self, offset: u32) -> Self {
        self.start = offset;
        self
    }

    /// Use `fetchers` concurrent readers
    #[must_use]
    pub fn fetchers(mut self, fetchers: usize) -> Self {
        self.fetchers = fetchers;
        self
    }
}

/// Offset where the data ended, `u64::MAX` until a fetcher finds it
#[derive(Debug)]
struct EndOfData(AtomicU64);

impl EndOfData {
    fn new() -> Self {
        Self(AtomicU64::new(u64::MAX))
    }

    fn mark(&self, offset: u32) {
        self.0.fetch_min(u64::from(offset), Ordering::SeqCst);
    }

    fn is_past(&self, offset: u32) -> bool {
        u64::from(offset) >= self.0.load(Ordering::SeqCst)
    }
}

/// Start a fetch stage in `group` and return the record receiver
pub fn spawn_fetch<S: PageSource>(
    group: &mut TaskGroup,
    source: Arc<S>,
    options: FetchOptions,
    stats: Arc<PipelineStats>,
) -> mpsc::Receiver<S::Item> {
    let fetchers = options.fetchers.max(1);
    let page_size = clamp_page_size(options.page_size);
    let (offset_tx, offset_rx) = mpsc::channel::<u32>(fetchers * 2);
    let (record_tx, record_rx) = mpsc::channel(options.buffer.max(1));
    let end = Arc::new(EndOfData::new());

    {
        let source = Arc::clone(&source);
        let end = Arc::clone(&end);
        group.spawn("producer", async move {
            let total = source.total().await?;
            let total = total.map(|t| u32::try_from(t).unwrap_or(u32::MAX));
            info!(start = options.start, ?total, page_size, fetchers, "Reading");

            let mut pushed = 0u32;
            for offset in PageWindow::new(options.start, page_size, total) {
                if end.is_past(offset) {
                    break;
                }
                if offset_tx.send(offset).await.is_err() {
                    break;
                }
                pushed += 1;
            }
            debug!(pages = pushed, "Producer done");
            Ok(())
        });
    }

    let offset_rx = Arc::new(Mutex::new(offset_rx));
    for id in 1..=fetchers {
        let source = Arc::clone(&source);
        let offsets = Arc::clone(&offset_rx);
        let records = record_tx.clone();
        let end = Arc::clone(&end);
        let stats = Arc::clone(&stats);
        group.spawn(format!("fetcher-{id:02}"), async move {
            loop {
                let next = offsets.lock().await.recv().await;
                let Some(offset) = next else { break };
                if end.is_past(offset) {
                    stats.add_skipped_page();
                    continue;
                }

                let page = source.fetch(offset, page_size).await?;
                stats.add_page(page.len());
                debug!(fetcher = id, offset, records = page.len(), "Fetched page");
                if page.is_empty() {
                    end.mark(offset);
                    continue;
                }
                for item in page {
                    if records.send(item).await.is_err() {
                        // receiver gone; whoever dropped it reports the outcome
                        return Ok(());
                    }
                }
            }
            Ok(())
        });
    }

    record_rx
}

/// Read every record one page at a time
pub async fn read_all<S: PageSource>(
    source: &S,
    page_size: u32,
    stop: StopCondition,
) -> Result<Vec<S::Item>> {
    let paginator = OffsetPaginator::new(page_size, stop);
    let mut state = PaginationState::new();
    let mut items = Vec::new();
    let mut next = paginator.first_page(&state);

    while let crate::pagination::NextPage::Continue { offset, count } = next {
        let page = source.fetch(offset, count).await?;
        let n = page.len();
        items.extend(page);
        next = paginator.process_page(n, &mut state);
    }
    debug!(pages = state.pages, records = state.total_fetched, "Read all");
    Ok(items)
}
