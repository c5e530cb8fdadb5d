//! CRM table client
//!
//! `Api` is a logged-in handle; `Table` binds it to one object name and
//! exposes the read/write endpoints:
//!
//! ```ignore
//! let api = Api::connect(&config).await?;
//! let total = api.supporter().count(&Criteria::parse("State=TX")).await?;
//! let page: Vec<Supporter> = api.supporter().many(0, 500, &Criteria::new()).await?;
//! ```

mod client;
pub mod endpoints;
pub mod records;
mod table;
mod types;

pub use client::Api;
pub use records::{BlastDonation, Donation, Email, Group, Supporter, SupporterGroup};
pub use table::Table;
pub use types::{
    decode_list, decode_page, parse_count, ApiResult, Criteria, FieldDescriptor, SaveRequest,
};
