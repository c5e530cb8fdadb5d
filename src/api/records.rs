//! Typed records for the tables the jobs read
//!
//! Only the columns a job needs are declared; the CRM sends more and serde
//! ignores them. Missing columns take their defaults.

use crate::dates::SalsaTimestamp;
use serde::{Deserialize, Serialize};

/// Address-bearing part of a supporter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supporter {
    #[serde(rename = "supporter_KEY")]
    pub key: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Street")]
    pub street: String,
    #[serde(rename = "Street_2")]
    pub street_2: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Zip")]
    pub zip: String,
    #[serde(rename = "Country")]
    pub country: String,
}

impl Supporter {
    /// Address columns in save order
    pub fn address_fields(&self) -> Vec<(String, String)> {
        vec![
            ("Street".to_string(), self.street.clone()),
            ("Street_2".to_string(), self.street_2.clone()),
            ("City".to_string(), self.city.clone()),
            ("State".to_string(), self.state.clone()),
            ("Zip".to_string(), self.zip.clone()),
            ("Country".to_string(), self.country.clone()),
        ]
    }
}

/// A donation and the supporter who made it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Donation {
    #[serde(rename = "donation_KEY")]
    pub key: String,
    #[serde(rename = "supporter_KEY")]
    pub supporter_key: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Last_Modified")]
    pub last_modified: SalsaTimestamp,
}

/// Membership of a supporter in a group
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SupporterGroup {
    #[serde(rename = "supporter_groups_KEY")]
    pub key: String,
    #[serde(rename = "supporter_KEY")]
    pub supporter_key: String,
    #[serde(rename = "groups_KEY")]
    pub groups_key: String,
}

/// A group
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "groups_KEY")]
    pub key: String,
    #[serde(rename = "Group_Name")]
    pub name: String,
    #[serde(rename = "parent_KEY")]
    pub parent_key: String,
}

/// One email sent to a supporter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Email {
    #[serde(rename = "email_KEY")]
    pub key: String,
    #[serde(rename = "supporter_KEY")]
    pub supporter_key: String,
    #[serde(rename = "email_blast_KEY")]
    pub email_blast_key: String,
    /// e.g. `Wed Aug 01 2018 11:30:51 GMT-0400 (EDT)`, empty when unsent
    #[serde(rename = "Time_Sent")]
    pub time_sent: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// A donation attributed to an email blast through its tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlastDonation {
    #[serde(rename = "email_blast_KEY")]
    pub email_blast_key: String,
    #[serde(rename = "Date_Requested")]
    pub date_requested: SalsaTimestamp,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Amount")]
    pub amount: String,
}
