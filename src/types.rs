//! Common types used throughout salsadig
//!
//! Shared type aliases for records returned by the CRM, plus small
//! enums used by more than one module.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// One CRM record. Field order is preserved as returned by the API.
pub type Record = serde_json::Map<String, JsonValue>;

// ============================================================================
// Record helpers
// ============================================================================

/// Read access to untyped records
///
/// The CRM returns nearly everything as strings, but a few columns come back
/// as numbers or booleans. `text` flattens all of them.
pub trait RecordExt {
    /// Field value as text. Missing and null fields are empty.
    fn text(&self, field: &str) -> String;

    /// Primary key of the record for `table` (`<table>_KEY`), if present.
    fn primary_key(&self, table: &str) -> Option<String>;

    /// All fields as `(name, text)` pairs, in API order
    fn to_pairs(&self) -> Vec<(String, String)>;
}

impl RecordExt for Record {
    fn text(&self, field: &str) -> String {
        self.get(field).map(value_text).unwrap_or_default()
    }

    fn primary_key(&self, table: &str) -> Option<String> {
        let key = self.text(&format!("{table}_KEY"));
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    fn to_pairs(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), value_text(v))).collect()
    }
}

/// Render a JSON value the way the CRM would show it
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Read Mode
// ============================================================================

/// Which read endpoint a paged read uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// `getObjects.sjs`, a single table
    #[default]
    Objects,
    /// `getLeftJoin.sjs`, a join expression
    LeftJoin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_record_text() {
        let r = record(json!({
            "supporter_KEY": "42",
            "Amount": 12.5,
            "Receive_Email": 1,
            "Note": null
        }));
        assert_eq!(r.text("supporter_KEY"), "42");
        assert_eq!(r.text("Amount"), "12.5");
        assert_eq!(r.text("Receive_Email"), "1");
        assert_eq!(r.text("Note"), "");
        assert_eq!(r.text("Missing"), "");
    }

    #[test]
    fn test_primary_key() {
        let r = record(json!({"donation_KEY": "9", "supporter_KEY": ""}));
        assert_eq!(r.primary_key("donation"), Some("9".to_string()));
        assert_eq!(r.primary_key("supporter"), None);
        assert_eq!(r.primary_key("groups"), None);
    }

    #[test]
    fn test_to_pairs_keeps_order() {
        let r = record(json!({"b": "2", "a": "1", "c": 3}));
        let pairs = r.to_pairs();
        let names: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(pairs[2].1, "3");
    }
}
