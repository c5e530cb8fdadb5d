//! Table operations
//!
//! A `Table` is a CRM object name bound to an authenticated `Api`. Reads come
//! in three flavors: typed (`one`, `many`, `left_join`), untyped `Record`s
//! (`*_map`) and the raw body (`*_raw`).

use super::client::Api;
use super::endpoints;
use super::types::{
    decode_list, decode_page, parse_count, ApiResult, Criteria, FieldDescriptor, SaveRequest,
};
use crate::auth::excerpt;
use crate::error::{Error, Result};
use crate::types::{ReadMode, Record};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// A named CRM table
#[derive(Debug, Clone)]
pub struct Table {
    api: Api,
    name: String,
}

impl Table {
    pub(crate) fn new(api: Api, name: impl Into<String>) -> Self {
        Self {
            api,
            name: name.into(),
        }
    }

    /// Object name, e.g. `supporter` or a join expression
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key column, `<name>_KEY`
    pub fn key_field(&self) -> String {
        format!("{}_KEY", self.name)
    }

    async fn get_text(&self, path: &str, request: crate::http::RequestConfig) -> Result<String> {
        self.api
            .http()
            .request_text(Method::GET, path, request)
            .await
    }

    // ========================================================================
    // Single record
    // ========================================================================

    /// Body of `getObject.sjs` for `key`
    pub async fn one_raw(&self, key: &str) -> Result<String> {
        self.get_text(endpoints::GET_OBJECT, endpoints::one(&self.name, key))
            .await
    }

    /// One record decoded into `T`
    pub async fn one<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let body = self.one_raw(key).await?;
        serde_json::from_str(&body).map_err(|e| {
            Error::decode(format!("{} {key}: {e}: {}", self.name, excerpt(&body)))
        })
    }

    /// One record as field/value pairs
    pub async fn one_map(&self, key: &str) -> Result<Record> {
        self.one(key).await
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Body of `getObjects.sjs` for one page
    pub async fn many_raw(&self, offset: u32, count: u32, criteria: &Criteria) -> Result<String> {
        self.get_text(
            endpoints::GET_OBJECTS,
            endpoints::page(&self.name, offset, count, criteria),
        )
        .await
    }

    /// One page of records decoded into `T`. An empty page is end of data.
    pub async fn many<T: DeserializeOwned>(
        &self,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<T>> {
        let body = self.many_raw(offset, count, criteria).await?;
        self.page_from_body(&body, offset, count, criteria)
    }

    /// One page of untyped records
    pub async fn many_map(
        &self,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<Record>> {
        self.many(offset, count, criteria).await
    }

    /// Body of `getLeftJoin.sjs` for one page
    pub async fn left_join_raw(
        &self,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<String> {
        self.get_text(
            endpoints::GET_LEFT_JOIN,
            endpoints::page(&self.name, offset, count, criteria),
        )
        .await
    }

    /// One page of a join such as `supporter(supporter_KEY)donation`
    pub async fn left_join<T: DeserializeOwned>(
        &self,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<T>> {
        let body = self.left_join_raw(offset, count, criteria).await?;
        self.page_from_body(&body, offset, count, criteria)
    }

    /// One page of a join as untyped records
    pub async fn left_join_map(
        &self,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<Record>> {
        self.left_join(offset, count, criteria).await
    }

    /// One page through the endpoint selected by `mode`
    pub async fn read<T: DeserializeOwned>(
        &self,
        mode: ReadMode,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<T>> {
        match mode {
            ReadMode::Objects => self.many(offset, count, criteria).await,
            ReadMode::LeftJoin => self.left_join(offset, count, criteria).await,
        }
    }

    fn page_from_body<T: DeserializeOwned>(
        &self,
        body: &str,
        offset: u32,
        count: u32,
        criteria: &Criteria,
    ) -> Result<Vec<T>> {
        match decode_page(body) {
            Ok(records) => {
                debug!(table = %self.name, offset, count, records = records.len(), "Read page");
                Ok(records)
            }
            Err(e) => {
                warn!(
                    table = %self.name,
                    offset,
                    count,
                    criteria = %criteria,
                    body = excerpt(body),
                    "Undecodable page: {e}"
                );
                Err(Error::decode(format!(
                    "{} page at offset {offset}: {e}",
                    self.name
                )))
            }
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Number of records matching `criteria`
    pub async fn count(&self, criteria: &Criteria) -> Result<u64> {
        let body = self
            .get_text(endpoints::GET_COUNT, endpoints::count(&self.name, criteria))
            .await?;
        parse_count(&body)
    }

    /// Column descriptions
    pub async fn describe(&self) -> Result<Vec<FieldDescriptor>> {
        let body = self
            .get_text(endpoints::DESCRIBE, endpoints::describe(&self.name))
            .await?;
        decode_list(&body)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Save fields on `key` (`0` creates a record)
    pub async fn save(&self, key: &str, fields: &[(String, String)]) -> Result<Vec<ApiResult>> {
        let request = SaveRequest {
            key: key.to_string(),
            fields: fields.to_vec(),
        };
        self.save_bulk(std::slice::from_ref(&request)).await
    }

    /// Save several records in one request
    ///
    /// Fails with the first `error` result the CRM reports.
    pub async fn save_bulk(&self, batch: &[SaveRequest]) -> Result<Vec<ApiResult>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let form = endpoints::save_form(&self.name, batch);
        let response = self.api.http().post_form(endpoints::SAVE, form).await?;
        let body = response.text().await.map_err(Error::Http)?;
        debug!(table = %self.name, records = batch.len(), "Saved");

        let results: Vec<ApiResult> = decode_list(&body).map_err(|e| {
            Error::decode(format!("save response for {}: {e}: {}", self.name, excerpt(&body)))
        })?;
        results.into_iter().map(ApiResult::into_result).collect()
    }

    /// Delete the record with `key`
    pub async fn delete(&self, key: &str) -> Result<ApiResult> {
        let body = self
            .get_text(endpoints::DELETE, endpoints::delete(&self.name, key))
            .await?;
        let results: Vec<ApiResult> = decode_list(&body).map_err(|e| {
            Error::decode(format!("delete response for {} {key}: {e}", self.name))
        })?;
        let result = results.into_iter().next().unwrap_or_else(|| ApiResult {
            object: self.name.clone(),
            key: key.to_string(),
            ..Default::default()
        });
        result.into_result()
    }
}
