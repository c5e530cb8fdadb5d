//! Set analysis over CRM data

mod census;

pub use census::{analyze, difference, intersect, Census, Members, Overlap};
