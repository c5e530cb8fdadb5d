//! Tests for the HTTP client module

use super::*;
use crate::config::Credentials;
use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

async fn logged_in_client(server: &MockServer) -> HttpClient {
    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "JSESSIONID=s1; Path=/")
                .set_body_string(r#"{"status":"success","message":"ok"}"#),
        )
        .mount(server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    let client = HttpClient::with_credentials(
        config,
        Credentials::new(server.uri(), "manager@example.org", "pw"),
    )
    .unwrap();
    client.authenticate().await.unwrap();
    client
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 0);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("salsadig/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://salsa4.salsalabs.com")
        .timeout(Duration::from_secs(5))
        .max_retries(2)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(
        config.base_url,
        Some("https://salsa4.salsalabs.com".to_string())
    );
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_keeps_repeated_params() {
    let config = RequestConfig::new()
        .query("object", "supporter")
        .query("condition", "State=TX")
        .query("condition", "Country=US")
        .timeout(Duration::from_secs(10))
        .retries(1);

    assert_eq!(config.query.len(), 3);
    assert_eq!(config.query_value("condition"), Some("State=TX"));
    assert_eq!(config.query[2], ("condition".into(), "Country=US".into()));
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(config.max_retries, Some(1));
    assert!(config.form.is_none());
}

#[tokio::test]
async fn test_get_with_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/getCount.sjs"))
        .and(query_param("object", "donation"))
        .and(query_param("countColumn", "donation_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_string("17"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let body = client
        .request_text(
            reqwest::Method::GET,
            "/api/getCount.sjs",
            RequestConfig::new()
                .query("json", "")
                .query("object", "donation")
                .query("countColumn", "donation_KEY"),
        )
        .await
        .unwrap();

    assert_eq!(body, "17");
}

#[tokio::test]
async fn test_get_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": 42
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let data: serde_json::Value = client.get_json("/api/data").await.unwrap();

    assert_eq!(data["value"], 42);
}

#[tokio::test]
async fn test_post_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/save"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("json=&object=supporter&key=7&State=TX"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let form = vec![
        ("json".to_string(), String::new()),
        ("object".to_string(), "supporter".to_string()),
        ("key".to_string(), "7".to_string()),
        ("State".to_string(), "TX".to_string()),
    ];
    let response = client.post_form("/save", form).await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/secure"))
        .and(header("X-Trace", "t1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .header("X-Trace", "t1")
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let response = client.get("/api/secure").await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_session_cookie_sent_after_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/getObject.sjs"))
        .and(header("cookie", "JSESSIONID=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    let response = client.get("/api/getObject.sjs").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_request_before_login_fails() {
    let server = MockServer::start().await;
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    let client =
        HttpClient::with_credentials(config, Credentials::new(server.uri(), "a", "b")).unwrap();

    let result = client.get("/api/getObject.sjs").await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_authenticate_without_credentials() {
    let client = HttpClient::new().unwrap();
    assert!(matches!(
        client.authenticate().await,
        Err(Error::Config { .. })
    ));
}

#[tokio::test]
async fn test_404_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client.get("/api/missing").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert_eq!(err.to_string(), "HTTP 404: Not found");
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client.get("/api/flaky").await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_retry_on_500_when_enabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(3)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let response = client.get("/api/flaky").await.unwrap();

    assert_eq!(response.status(), 200);
}

fn retrying_client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

#[tokio::test]
async fn test_retry_on_gateway_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/edge"))
        .respond_with(ResponseTemplate::new(522))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/edge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = retrying_client(&server);
    assert_eq!(client.get("/api/edge").await.unwrap().status(), 200);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/bad"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying_client(&server);
    let err = client.get("/api/bad").await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limited_without_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = client.get("/api/limited").await.unwrap_err();
    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 7
        }
    ));
}

#[tokio::test]
async fn test_full_url_bypasses_base() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/us/78757"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();
    let client = HttpClient::with_config(config).unwrap();

    let response = client
        .get(&format!("{}/us/78757", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[test]
fn test_build_url_joins_slashes() {
    let config = HttpClientConfig::builder()
        .base_url("https://salsa4.salsalabs.com/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/save"),
        "https://salsa4.salsalabs.com/save"
    );
    assert_eq!(
        client.build_url("api/getObjects.sjs"),
        "https://salsa4.salsalabs.com/api/getObjects.sjs"
    );
}

#[test]
fn test_invalid_base_url_rejected() {
    let config = HttpClientConfig::builder().base_url("https://").build();
    let err = HttpClient::with_config(config).unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[test]
fn test_calculate_backoff() {
    let backoff = |kind| {
        let config = HttpClientConfig::builder()
            .backoff(kind, Duration::from_millis(100), Duration::from_millis(500))
            .no_rate_limit()
            .build();
        HttpClient::with_config(config).unwrap()
    };

    let constant = backoff(BackoffType::Constant);
    assert_eq!(constant.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(constant.calculate_backoff(5), Duration::from_millis(100));

    let linear = backoff(BackoffType::Linear);
    assert_eq!(linear.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(300));

    let exponential = backoff(BackoffType::Exponential);
    assert_eq!(exponential.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(exponential.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(exponential.calculate_backoff(10), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("has_authenticator: false"));
    assert!(client.has_rate_limiter());
}

#[tokio::test]
async fn test_rate_limited_client_still_serves() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();

    let client = HttpClient::with_config(config).unwrap();

    for _ in 0..3 {
        let response = client.get("/api/data").await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
