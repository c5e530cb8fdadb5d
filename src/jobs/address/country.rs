//! Country name normalization

use std::collections::HashMap;
use std::sync::LazyLock;

/// Spellings seen in supporter records, keyed by their canonical form
/// (upper case, no dots, single spaces)
static ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let table: [(&str, &[&str]); 4] = [
        (
            "US",
            &[
                "US",
                "USA",
                "U S",
                "U S A",
                "AMERICA",
                "UNITED STATES",
                "UNITED STATES OF AMERICA",
                "UNITED STATES AMERICA",
                "THE UNITED STATES",
            ],
        ),
        ("CA", &["CA", "CAN", "CANADA"]),
        ("MX", &["MX", "MEX", "MEXICO", "MÉXICO"]),
        (
            "GB",
            &[
                "GB",
                "GBR",
                "UK",
                "U K",
                "UNITED KINGDOM",
                "GREAT BRITAIN",
                "ENGLAND",
                "SCOTLAND",
                "WALES",
            ],
        ),
    ];
    table
        .iter()
        .flat_map(|(code, names)| names.iter().map(move |name| (*name, *code)))
        .collect()
});

/// What a supporter's `Country` field turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryMatch {
    /// Nothing there
    Empty,
    /// A known spelling of this two-letter code
    Alias(&'static str),
    /// Some other two-letter code, upper-cased
    Code(String),
    /// A name that has to be looked up
    Name(String),
}

/// Canonical form used for alias matching
fn canonical(raw: &str) -> String {
    raw.replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Classify a raw `Country` value
pub fn normalize(raw: &str) -> CountryMatch {
    let key = canonical(raw);
    if key.is_empty() {
        return CountryMatch::Empty;
    }
    if let Some(code) = ALIASES.get(key.as_str()) {
        return CountryMatch::Alias(code);
    }
    if key.chars().count() <= 2 {
        CountryMatch::Code(key)
    } else {
        CountryMatch::Name(raw.trim().to_string())
    }
}

/// Fold lookup results onto the codes the CRM uses
///
/// RestCountries answers "United States" with the Minor Outlying Islands.
pub fn fold_lookup_code(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "UM" => "US".to_string(),
        other => other.to_string(),
    }
}
