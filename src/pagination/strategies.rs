//! Offset pagination
//!
//! `OffsetPaginator` drives a sequential read one page at a time.
//! `PageWindow` hands out windows up front for concurrent fetchers.

use super::types::{
    check_stop_condition, clamp_page_size, NextPage, PaginationState, StopCondition,
};

// ============================================================================
// Sequential reads
// ============================================================================

/// Offset pagination for a single reader
///
/// ```text
/// limit=0,500 -> 500 records
/// limit=500,500 -> 120 records
/// limit=1000,500 -> 0 records, done
/// ```
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Records per page
    pub page_size: u32,
    /// Stop condition
    pub stop_condition: StopCondition,
}

impl OffsetPaginator {
    /// Create a new offset paginator. The page size is clamped to the CRM maximum.
    pub fn new(page_size: u32, stop_condition: StopCondition) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            stop_condition,
        }
    }

    /// First window to read
    pub fn first_page(&self, state: &PaginationState) -> NextPage {
        if state.done {
            return NextPage::Done;
        }
        NextPage::Continue {
            offset: state.offset,
            count: self.page_size,
        }
    }

    /// Account for a page and decide what to read next
    pub fn process_page(&self, records_count: usize, state: &mut PaginationState) -> NextPage {
        state.record_page(records_count);

        if check_stop_condition(&self.stop_condition, records_count, self.page_size, state)
            .should_stop()
        {
            let end = state.offset.saturating_add(records_count as u32);
            state.mark_end(end);
            return NextPage::Done;
        }

        state.add_offset(self.page_size);
        NextPage::Continue {
            offset: state.offset,
            count: self.page_size,
        }
    }
}

impl Default for OffsetPaginator {
    fn default() -> Self {
        Self::new(super::MAX_PAGE_SIZE, StopCondition::EmptyPage)
    }
}

// ============================================================================
// Windows for concurrent reads
// ============================================================================

/// Iterator over page offsets
///
/// With a total, stops at the first offset at or past it. Without one, it
/// never ends and the consumer decides when to stop.
#[derive(Debug, Clone)]
pub struct PageWindow {
    next: u32,
    page_size: u32,
    total: Option<u32>,
}

impl PageWindow {
    /// Offsets from `start` in steps of `page_size` (clamped to the CRM maximum)
    pub fn new(start: u32, page_size: u32, total: Option<u32>) -> Self {
        Self {
            next: start,
            page_size: clamp_page_size(page_size),
            total,
        }
    }

    /// Records requested per window
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of windows left, if bounded
    pub fn remaining(&self) -> Option<u32> {
        self.total
            .map(|total| total.saturating_sub(self.next).div_ceil(self.page_size))
    }
}

impl Iterator for PageWindow {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if let Some(total) = self.total {
            if self.next >= total {
                return None;
            }
        }
        let offset = self.next;
        self.next = self.next.checked_add(self.page_size)?;
        Some(offset)
    }
}
