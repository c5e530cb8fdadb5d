//! Pagination module
//!
//! The CRM only knows offset/count paging (`limit=offset,count`, at most
//! 500 records per page). End of data is an empty page.

mod strategies;
mod types;

pub use strategies::{OffsetPaginator, PageWindow};
pub use types::{
    check_stop_condition, clamp_page_size, limit_param, NextPage, PaginationState, StopCondition,
    StopResult, MAX_PAGE_SIZE,
};
