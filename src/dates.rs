//! CRM timestamps
//!
//! The CRM renders dates like `Wed Aug 01 2018 11:30:51 GMT-0400 (EDT)`.
//! The trailing zone name is informational and dropped before parsing.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Layout of a CRM timestamp once the zone name is removed
const SALSA_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DDTHH:MM:SS`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a CRM timestamp, keeping its UTC offset
pub fn parse_salsa_timestamp(text: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = strip_zone_name(text.trim());
    DateTime::parse_from_str(trimmed, SALSA_FORMAT)
        .map_err(|e| Error::decode(format!("invalid CRM timestamp '{text}': {e}")))
}

fn strip_zone_name(text: &str) -> &str {
    match text.rfind(" (") {
        Some(idx) if text.ends_with(')') => &text[..idx],
        _ => text,
    }
}

/// `YYYY-MM-DD` in the timestamp's own offset. Empty input stays empty.
pub fn short_date(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(String::new());
    }
    Ok(parse_salsa_timestamp(text)?.format(DATE_FORMAT).to_string())
}

/// `YYYY-MM-DDTHH:MM:SS.000Z` in UTC. Unparseable input is returned as-is.
pub fn engage_date(text: &str) -> String {
    match parse_salsa_timestamp(text) {
        Ok(t) => t
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        Err(e) => {
            warn!("{e}");
            text.to_string()
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SS` wall time. Unparseable input is returned as-is.
pub fn engage_timestamp(text: &str) -> String {
    match parse_salsa_timestamp(text) {
        Ok(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        Err(e) => {
            warn!("{e}");
            text.to_string()
        }
    }
}

/// Parse a `YYYY-MM-DD` day, as taken on the command line
pub fn parse_day(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| Error::invalid_value("date", format!("'{text}' is not YYYY-MM-DD: {e}")))
}

/// A CRM timestamp field
///
/// `null`, empty and truncated values deserialize as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalsaTimestamp(Option<DateTime<FixedOffset>>);

impl SalsaTimestamp {
    /// Wrap a parsed time
    pub fn new(time: DateTime<FixedOffset>) -> Self {
        Self(Some(time))
    }

    /// True when the field held a timestamp
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The parsed time, if any
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        self.0
    }

    /// Calendar year, if set
    pub fn year(&self) -> Option<i32> {
        self.0.map(|t| t.year())
    }

    /// Parse loosely: anything that is not a full CRM timestamp is unset
    pub fn parse_lenient(text: &str) -> Self {
        let text = text.trim();
        // weekday month day year time offset zone
        if text.split_whitespace().count() < 7 {
            return Self(None);
        }
        match parse_salsa_timestamp(text) {
            Ok(t) => Self(Some(t)),
            Err(e) => {
                warn!("{e}");
                Self(None)
            }
        }
    }
}

impl<'de> Deserialize<'de> for SalsaTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(Self::parse_lenient)
            .unwrap_or_default())
    }
}

impl Serialize for SalsaTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(t) => serializer.serialize_str(&t.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}
