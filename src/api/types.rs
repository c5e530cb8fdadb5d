//! Wire types for the CRM API

use crate::error::{Error, Result};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Criteria
// ============================================================================

/// Condition clauses for reads and counts
///
/// Each clause becomes one `condition=` query parameter. The raw form used on
/// the command line joins clauses with `&condition=`:
///
/// ```text
/// Last_Modified>=2021-01-01&condition=Last_Modified<2022-01-01
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    clauses: Vec<String>,
}

impl Criteria {
    /// No conditions
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the raw `&condition=`-joined form. Empty clauses are dropped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let raw = raw.strip_prefix("&condition=").unwrap_or(raw);
        let raw = raw.strip_prefix("condition=").unwrap_or(raw);
        Self {
            clauses: raw
                .split("&condition=")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Add a clause
    #[must_use]
    pub fn and(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        if !clause.trim().is_empty() {
            self.clauses.push(clause);
        }
        self
    }

    /// True when there are no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The clauses, in order
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// Query parameters, one `condition` per clause
    pub fn query_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.clauses
            .iter()
            .map(|c| ("condition".to_string(), c.clone()))
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join("&condition="))
    }
}

impl FromStr for Criteria {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Criteria {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

// ============================================================================
// Write results
// ============================================================================

/// Outcome of a `/save` or `/delete`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResult {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl ApiResult {
    /// True when the CRM rejected the write
    pub fn is_error(&self) -> bool {
        self.result.eq_ignore_ascii_case("error")
    }

    /// Turn an `error` result into an `Error::Api`
    pub fn into_result(self) -> Result<Self> {
        if self.is_error() {
            let message = if self.messages.is_empty() {
                "request rejected".to_string()
            } else {
                self.messages.join("; ")
            };
            Err(Error::api(self.object, self.key, message))
        } else {
            Ok(self)
        }
    }
}

/// One record to write in a bulk save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    /// Primary key; `0` or empty creates a record
    pub key: String,
    /// Field names and values
    pub fields: Vec<(String, String)>,
}

impl SaveRequest {
    /// Update of `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Vec::new(),
        }
    }

    /// Set a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Describe
// ============================================================================

/// One column returned by `describe2.sjs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub data_table: String,
    #[serde(default)]
    pub data_column: String,
    #[serde(default)]
    pub display_to_supporters: String,
    #[serde(rename = "isCustom", default, deserialize_with = "loose_bool")]
    pub is_custom: bool,
    #[serde(default, deserialize_with = "loose_bool")]
    pub is_a_zero_index_enum: bool,
}

/// Booleans arrive as `true`, `"true"`, `"1"` or `1`
fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Int(i64),
        Text(String),
        Null(()),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Bool(b) => Ok(b),
        Loose::Int(n) => Ok(n != 0),
        Loose::Null(()) => Ok(false),
        Loose::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(de::Error::custom(format!("not a boolean: {other}"))),
        },
    }
}

// ============================================================================
// Decoding helpers
// ============================================================================

/// A body holding either a list or a single object
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Decode a list, accepting a bare object as a list of one
pub fn decode_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let parsed: OneOrMany<T> = serde_json::from_str(body)?;
    Ok(match parsed {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

/// Decode a page of records. Only a JSON array is a page.
pub fn decode_page<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    Ok(serde_json::from_str(body)?)
}

/// Parse a `getCount.sjs` body
///
/// The endpoint answers with the bare number. Quoted numbers and
/// `{"count": n}` are accepted too.
pub fn parse_count(body: &str) -> Result<u64> {
    let text = body.trim();
    if let Ok(n) = text.parse::<u64>() {
        return Ok(n);
    }
    let unquoted = text.trim_matches('"').trim();
    if let Ok(n) = unquoted.parse::<u64>() {
        return Ok(n);
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) {
        if let Some(n) = map
            .get("count")
            .map(crate::types::value_text)
            .and_then(|s| s.parse::<u64>().ok())
        {
            return Ok(n);
        }
    }
    Err(Error::decode(format!(
        "count response is not a number: {}",
        crate::auth::excerpt(text)
    )))
}
