//! Postal code and country name lookups
//!
//! Both services are free and slow, and supporter lists repeat the same codes
//! and names over and over, so answers (including "no match") are cached for
//! the life of the client. Errors are not cached.

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// One place returned for a postal code
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Place {
    #[serde(rename = "place name")]
    pub name: String,
    pub state: String,
    #[serde(rename = "state abbreviation")]
    pub state_abbreviation: String,
}

/// A Zippopotamus answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostalResult {
    #[serde(rename = "post code")]
    pub post_code: String,
    pub country: String,
    #[serde(rename = "country abbreviation")]
    pub country_abbreviation: String,
    pub places: Vec<Place>,
}

impl PostalResult {
    /// The first place; callers only trust that one
    pub fn first_place(&self) -> Option<&Place> {
        self.places.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CountryEntry {
    #[serde(rename = "alpha2Code", default)]
    alpha2_code: String,
}

/// Path of percent-encoded `segments`, so input never adds segments or a query
fn encoded_path(segments: &[&str]) -> Result<String> {
    let mut url = url::Url::parse("http://lookup.invalid")?;
    url.path_segments_mut()
        .map_err(|_| Error::lookup("path", "base cannot hold segments"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().to_string())
}

/// A 404 means the service knows nothing about the input
fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::HttpStatus { status: 404, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Client for `api.zippopotam.us`
#[derive(Debug)]
pub struct Zippopotamus {
    http: HttpClient,
    cache: Mutex<HashMap<String, Option<PostalResult>>>,
}

impl Zippopotamus {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_config(config)?,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Places for `code` in `country`. `None` when there are none.
    pub async fn lookup(&self, country: &str, code: &str) -> Result<Option<PostalResult>> {
        let path = encoded_path(&[country, code])?;
        if let Some(hit) = self.cache.lock().await.get(&path) {
            return Ok(hit.clone());
        }

        let fetched = not_found_as_none(
            self.http
                .request_text(Method::GET, &path, RequestConfig::new())
                .await,
        )?;
        let result = match fetched {
            Some(body) => {
                let result: PostalResult = serde_json::from_str(&body).map_err(|e| {
                    Error::lookup("zippopotamus", format!("{path}: {e}"))
                })?;
                Some(result).filter(|r| !r.places.is_empty())
            }
            None => None,
        };
        debug!(%path, found = result.is_some(), "Postal lookup");

        self.cache.lock().await.insert(path, result.clone());
        Ok(result)
    }

    /// Number of cached answers
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }
}

/// Client for RestCountries `name` search
#[derive(Debug)]
pub struct RestCountries {
    http: HttpClient,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl RestCountries {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_config(config)?,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Two-letter code of the best match for `name`, as RestCountries has it
    pub async fn alpha2(&self, name: &str) -> Result<Option<String>> {
        let key = name.trim().to_lowercase();
        if let Some(hit) = self.cache.lock().await.get(&key) {
            return Ok(hit.clone());
        }

        let path = encoded_path(&["name", name.trim()])?;
        let fetched = not_found_as_none(
            self.http
                .request_text(Method::GET, &path, RequestConfig::new())
                .await,
        )?;
        let code = match fetched {
            Some(body) => {
                let entries: Vec<CountryEntry> = serde_json::from_str(&body).map_err(|e| {
                    Error::lookup("restcountries", format!("{path}: {e}"))
                })?;
                entries
                    .into_iter()
                    .map(|e| e.alpha2_code)
                    .find(|code| !code.is_empty())
            }
            None => None,
        };
        debug!(%name, ?code, "Country lookup");

        self.cache.lock().await.insert(key, code.clone());
        Ok(code)
    }
}
