//! Address rules for one supporter

use super::country::{fold_lookup_code, normalize, CountryMatch};
use super::lookup::{RestCountries, Zippopotamus};
use super::postal::PostalKind;
use crate::api::records::Supporter;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// One field change made to a supporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    pub key: String,
    pub field: String,
    pub old: String,
    pub new: String,
    pub reason: String,
}

impl Modification {
    /// Audit columns, in `Display` order
    pub const HEADERS: [&'static str; 5] = ["supporter_KEY", "Field", "Old", "New", "Reason"];

    /// Values for the audit columns
    pub fn row(&self) -> [String; 5] {
        [
            self.key.clone(),
            self.field.clone(),
            self.old.clone(),
            self.new.clone(),
            self.reason.clone(),
        ]
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = if self.old.is_empty() { "(empty)" } else { &self.old };
        write!(
            f,
            "Key: {:<8} Field: {:<10} New: {:<10} Old: {:<20} Reason: {}",
            self.key, self.field, self.new, old, self.reason
        )
    }
}

/// A supporter after fixing, with what changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixed {
    pub supporter: Supporter,
    pub modifications: Vec<Modification>,
}

impl Fixed {
    pub fn is_changed(&self) -> bool {
        !self.modifications.is_empty()
    }
}

/// Applies the address rules, in order:
///
/// 1. known country spellings become their two-letter code
/// 2. other country names longer than two characters are looked up
/// 3. a US or Canadian postal code is looked up; the first place's state
///    replaces `State`, and the answer's country replaces `Country`
/// 4. a still-empty `Country` gets the default
#[derive(Debug)]
pub struct AddressFixer {
    postal: Zippopotamus,
    countries: RestCountries,
    default_country: String,
}

struct Edit<'a> {
    supporter: &'a mut Supporter,
    modifications: Vec<Modification>,
}

impl Edit<'_> {
    fn set(&mut self, field: &str, new: &str, reason: impl Into<String>) {
        let slot = match field {
            "State" => &mut self.supporter.state,
            "Country" => &mut self.supporter.country,
            "Zip" => &mut self.supporter.zip,
            _ => return,
        };
        if slot.as_str() == new {
            return;
        }
        self.modifications.push(Modification {
            key: self.supporter.key.clone(),
            field: field.to_string(),
            old: std::mem::replace(slot, new.to_string()),
            new: new.to_string(),
            reason: reason.into(),
        });
    }
}

impl AddressFixer {
    pub fn new(
        postal: Zippopotamus,
        countries: RestCountries,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            postal,
            countries,
            default_country: default_country.into(),
        }
    }

    /// Run every rule on `supporter`
    pub async fn fix(&self, mut supporter: Supporter) -> Result<Fixed> {
        let mut edit = Edit {
            supporter: &mut supporter,
            modifications: Vec::new(),
        };

        self.fix_country(&mut edit).await?;
        self.fix_postal(&mut edit).await?;

        if edit.supporter.country.trim().is_empty() && !self.default_country.is_empty() {
            let default = self.default_country.clone();
            edit.set("Country", &default, "Default country");
        }

        let modifications = edit.modifications;
        Ok(Fixed {
            supporter,
            modifications,
        })
    }

    async fn fix_country(&self, edit: &mut Edit<'_>) -> Result<()> {
        let raw = edit.supporter.country.clone();
        match normalize(&raw) {
            CountryMatch::Empty => {}
            CountryMatch::Alias(code) => {
                edit.set("Country", code, format!("Country alias, '{raw}'"));
            }
            CountryMatch::Code(code) => {
                edit.set("Country", &code, "Country code case");
            }
            CountryMatch::Name(name) => match self.countries.alpha2(&name).await? {
                Some(code) => {
                    let code = fold_lookup_code(&code);
                    edit.set("Country", &code, format!("Country match, '{raw}'"));
                }
                None => {
                    debug!(key = %edit.supporter.key, country = %raw, "No country match");
                }
            },
        }
        Ok(())
    }

    async fn fix_postal(&self, edit: &mut Edit<'_>) -> Result<()> {
        let zip = edit.supporter.zip.trim().to_string();
        if zip.is_empty() {
            return Ok(());
        }
        let kind = PostalKind::classify(&zip);
        let (Some(country), Some(code)) = (kind.country(), kind.lookup_code(&zip)) else {
            debug!(key = %edit.supporter.key, zip = %zip, "Unknown postal format");
            return Ok(());
        };

        let Some(result) = self.postal.lookup(country, &code).await? else {
            debug!(key = %edit.supporter.key, zip = %zip, "No postal match");
            return Ok(());
        };
        if let Some(place) = result.first_place() {
            if !place.state_abbreviation.is_empty() {
                edit.set(
                    "State",
                    &place.state_abbreviation,
                    format!("Postal match, '{zip}'"),
                );
            }
        }
        if !result.country_abbreviation.is_empty() {
            edit.set(
                "Country",
                &result.country_abbreviation,
                format!("Postal match, '{zip}'"),
            );
        }
        Ok(())
    }
}
