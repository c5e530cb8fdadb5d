//! Postal code classification

use regex::Regex;
use std::sync::LazyLock;

/// ZIP or ZIP+4
static US_ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:[-\s]\d{4})?$").unwrap());

/// Canadian `A1A 1A1`, with or without the separator
static CA_POSTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\d[A-Za-z][ -]?\d[A-Za-z]\d$").unwrap());

/// Which country's format a postal code is in
///
/// Other countries also use five digits; those are read as US codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostalKind {
    Us,
    Ca,
    Unknown,
}

impl PostalKind {
    /// Classify a postal code. Surrounding whitespace is ignored.
    pub fn classify(code: &str) -> Self {
        let code = code.trim();
        if US_ZIP.is_match(code) {
            Self::Us
        } else if CA_POSTAL.is_match(code) {
            Self::Ca
        } else {
            Self::Unknown
        }
    }

    /// Two-letter country code for the format
    pub fn country(self) -> Option<&'static str> {
        match self {
            Self::Us => Some("US"),
            Self::Ca => Some("CA"),
            Self::Unknown => None,
        }
    }

    /// The part of `code` a postal lookup needs: five digits for a ZIP, the
    /// forward sortation area (first three characters) for Canada
    pub fn lookup_code(self, code: &str) -> Option<String> {
        let code = code.trim();
        match self {
            Self::Us => Some(code.chars().take(5).collect()),
            Self::Ca => Some(code.chars().take(3).collect::<String>().to_ascii_uppercase()),
            Self::Unknown => None,
        }
    }
}
