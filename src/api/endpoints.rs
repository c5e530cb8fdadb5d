//! CRM endpoint paths and request shapes

use super::types::{Criteria, SaveRequest};
use crate::http::RequestConfig;
use crate::pagination::{clamp_page_size, limit_param};

pub const AUTHENTICATE: &str = "/api/authenticate.sjs";
pub const GET_OBJECT: &str = "/api/getObject.sjs";
pub const GET_OBJECTS: &str = "/api/getObjects.sjs";
pub const GET_LEFT_JOIN: &str = "/api/getLeftJoin.sjs";
pub const GET_COUNT: &str = "/api/getCount.sjs";
pub const DESCRIBE: &str = "/api/describe2.sjs";
pub const SAVE: &str = "/save";
pub const DELETE: &str = "/delete";

fn base(table: &str) -> RequestConfig {
    RequestConfig::new().query("json", "").query("object", table)
}

fn with_criteria(mut request: RequestConfig, criteria: &Criteria) -> RequestConfig {
    request.query.extend(criteria.query_pairs());
    request
}

/// `getObject.sjs?json&object=T&key=K`
pub fn one(table: &str, key: &str) -> RequestConfig {
    base(table).query("key", key)
}

/// `getObjects.sjs` / `getLeftJoin.sjs` query: `json&object=T&limit=O,C[&condition=...]`
///
/// `count` is clamped to the CRM's page limit.
pub fn page(table: &str, offset: u32, count: u32, criteria: &Criteria) -> RequestConfig {
    let request = base(table).query("limit", limit_param(offset, clamp_page_size(count)));
    with_criteria(request, criteria)
}

/// `getCount.sjs?json&object=T&countColumn=T_KEY[&condition=...]`
pub fn count(table: &str, criteria: &Criteria) -> RequestConfig {
    let request = base(table).query("countColumn", format!("{table}_KEY"));
    with_criteria(request, criteria)
}

/// `describe2.sjs?json&object=T`
pub fn describe(table: &str) -> RequestConfig {
    base(table)
}

/// `/delete?json=true&object=T&key=K`
pub fn delete(table: &str, key: &str) -> RequestConfig {
    RequestConfig::new()
        .query("json", "true")
        .query("object", table)
        .query("key", key)
}

/// Form body for `/save`: `json`, then `object`, `key` and fields per record
pub fn save_form(table: &str, batch: &[SaveRequest]) -> Vec<(String, String)> {
    let mut form = vec![("json".to_string(), String::new())];
    for request in batch {
        form.push(("object".to_string(), table.to_string()));
        form.push(("key".to_string(), request.key.clone()));
        form.extend(request.fields.iter().cloned());
    }
    form
}
