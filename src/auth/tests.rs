//! Tests for the auth module

use super::*;
use crate::config::Credentials;
use crate::error::Error;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials(server: &MockServer) -> Credentials {
    Credentials::new(server.uri(), "manager@example.org", "s3cret")
}

#[tokio::test]
async fn test_apply_before_login_fails() {
    let auth = Authenticator::new(Credentials::new("example.org", "a", "b"));
    let req = reqwest::Client::new().get("https://example.org/api");

    let result = auth.apply(req).await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn test_login_captures_cookies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .and(query_param("email", "manager@example.org"))
        .and(query_param("password", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "JSESSIONID=abc123; Path=/; HttpOnly")
                .append_header("Set-Cookie", "hqtab_2=1; Path=/")
                .set_body_string(r#"{"status":"success","message":"Successful Login"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = Authenticator::new(credentials(&server));
    auth.login().await.unwrap();
    assert!(auth.is_authenticated().await);

    let req = reqwest::Client::new().get(format!("{}/api/getObjects.sjs", server.uri()));
    let built = auth.apply(req).await.unwrap().build().unwrap();
    assert_eq!(
        built.headers().get("cookie").unwrap(),
        "JSESSIONID=abc123; hqtab_2=1"
    );
}

#[tokio::test]
async fn test_login_error_status_in_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"error","message":"Invalid login, please try again."}"#,
        ))
        .mount(&server)
        .await;

    let auth = Authenticator::new(credentials(&server));
    let err = auth.login().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Authentication failed: Invalid login, please try again."
    );
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn test_login_http_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let auth = Authenticator::new(credentials(&server));
    let err = auth.login().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_login_unreadable_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/authenticate.sjs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[[[not a status"))
        .mount(&server)
        .await;

    let auth = Authenticator::new(credentials(&server));
    assert!(matches!(auth.login().await, Err(Error::Auth { .. })));
}

#[test]
fn test_excerpt_truncates_on_char_boundary() {
    let long = "é".repeat(300);
    let cut = excerpt(&long);
    assert!(cut.len() <= 200);
    assert!(long.starts_with(cut));
    assert_eq!(excerpt("short"), "short");
}
