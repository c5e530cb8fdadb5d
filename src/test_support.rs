//! Mock CRM helpers shared by unit tests

use crate::api::Api;
use crate::config::{Config, Credentials};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at `server`, unthrottled
pub(crate) fn mock_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.credentials = Credentials::new(server.uri(), "manager@example.org", "pw");
    config.http.requests_per_second = 0;
    config
}

/// Accept any login
pub(crate) async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "JSESSIONID=test; Path=/")
                .set_body_string(r#"{"status":"success","message":"Successful Login"}"#),
        )
        .mount(server)
        .await;
}

/// Logged-in `Api` against `server`
pub(crate) async fn mock_api(server: &MockServer) -> Api {
    mount_login(server).await;
    Api::connect(&mock_config(server)).await.unwrap()
}

/// Serve `body` for `getObjects.sjs` on `table` at `limit`
pub(crate) async fn mount_page(server: &MockServer, table: &str, limit: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/getObjects.sjs"))
        .and(query_param("object", table))
        .and(query_param("limit", limit))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `count` for `getCount.sjs` on `table`
pub(crate) async fn mount_count(server: &MockServer, table: &str, count: u64) {
    Mock::given(method("GET"))
        .and(path("/api/getCount.sjs"))
        .and(query_param("object", table))
        .respond_with(ResponseTemplate::new(200).set_body_string(count.to_string()))
        .mount(server)
        .await;
}

/// `n` records of `table` with keys starting at `first`
pub(crate) fn records(table: &str, first: u64, n: u64) -> Value {
    let key_field = format!("{table}_KEY");
    Value::Array(
        (first..first + n)
            .map(|k| {
                let mut record = serde_json::Map::new();
                record.insert(key_field.clone(), Value::String(k.to_string()));
                Value::Object(record)
            })
            .collect(),
    )
}

/// Serve an empty page for any read not mounted before this
pub(crate) async fn mount_empty_pages(server: &MockServer) {
    for endpoint in ["/api/getObjects.sjs", "/api/getLeftJoin.sjs"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(server)
            .await;
    }
}

/// Accept every `/save` and `/delete`
pub(crate) async fn mount_writes(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"object": "supporter", "key": "0", "result": "success", "messages": []}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/delete"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"object":"","key":"","result":"success","messages":[]}]"#),
        )
        .mount(server)
        .await;
}

/// Unthrottled plain client config for a third-party mock
pub(crate) fn lookup_config(server: &MockServer) -> crate::http::HttpClientConfig {
    crate::http::HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build()
}

/// Small pipeline sizing so tests cross page boundaries
pub(crate) fn small_fetch(page_size: u32) -> crate::pipeline::FetchOptions {
    crate::pipeline::FetchOptions {
        start: 0,
        page_size,
        fetchers: 2,
        buffer: 8,
    }
}
