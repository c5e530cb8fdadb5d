//! Pagination types
//!
//! The CRM pages with `limit=offset,count`. A read is finished when a page
//! comes back empty, or earlier when the caller knows better.

/// Largest page the CRM will return
pub const MAX_PAGE_SIZE: u32 = 500;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
pub fn clamp_page_size(count: u32) -> u32 {
    count.clamp(1, MAX_PAGE_SIZE)
}

/// Render the `limit` query value
pub fn limit_param(offset: u32, count: u32) -> String {
    format!("{offset},{count}")
}

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Read this window next
    Continue {
        /// Offset of the first record
        offset: u32,
        /// Records to request
        count: u32,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// When a paged read is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopCondition {
    /// Stop when a page has no records
    #[default]
    EmptyPage,

    /// Stop after a page shorter than the page size. Saves one request, but
    /// trusts the server never to return a short page mid-table.
    ShortPage,

    /// Stop once this many records have been read
    TotalCount(u64),
}

/// Result of checking a stop condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// Continue pagination
    Continue,
    /// Stop pagination
    Stop,
}

impl StopResult {
    /// Check if we should stop
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Offset of the next page
    pub offset: u32,
    /// Pages read so far
    pub pages: u32,
    /// Records read so far
    pub total_fetched: u64,
    /// Offset at which the data ended, once known
    pub end: Option<u32>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state that starts reading at `offset`
    pub fn starting_at(offset: u32) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Record a page of `count` records read at the current offset
    pub fn record_page(&mut self, count: usize) {
        self.pages += 1;
        self.total_fetched += count as u64;
    }

    /// Mark the data as ending at `offset`
    pub fn mark_end(&mut self, offset: u32) {
        self.end = Some(self.end.map_or(offset, |end| end.min(offset)));
        self.done = true;
    }

    /// Advance offset
    pub fn add_offset(&mut self, amount: u32) {
        self.offset = self.offset.saturating_add(amount);
    }
}

/// Check a stop condition after reading a page of `records_count` records
pub fn check_stop_condition(
    condition: &StopCondition,
    records_count: usize,
    page_size: u32,
    state: &PaginationState,
) -> StopResult {
    if records_count == 0 {
        return StopResult::Stop;
    }
    match condition {
        StopCondition::EmptyPage => StopResult::Continue,
        StopCondition::ShortPage => {
            if records_count < page_size as usize {
                StopResult::Stop
            } else {
                StopResult::Continue
            }
        }
        StopCondition::TotalCount(total) => {
            if state.total_fetched >= *total {
                StopResult::Stop
            } else {
                StopResult::Continue
            }
        }
    }
}
