//! Session types
//!
//! The CRM authenticates with a login call that sets session cookies.
//! Those cookies must accompany every later request.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use serde::{Deserialize, Serialize};

/// Status body returned by `authenticate.sjs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// `success` or `error`
    #[serde(default)]
    pub status: String,
    /// Human-readable login message
    #[serde(default)]
    pub message: String,
}

impl AuthStatus {
    /// Parse a login body. The body is JSON-ish; YAML is the lenient fallback.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body)
            .ok()
            .or_else(|| serde_yaml::from_str(body).ok())
    }

    /// True when the server rejected the login
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

/// A single `name=value` session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
}

impl SessionCookie {
    /// Parse the `name=value` part of a `Set-Cookie` header, ignoring attributes
    pub fn parse(set_cookie: &str) -> Option<Self> {
        let pair = set_cookie.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookies captured at login
    pub cookies: Vec<SessionCookie>,
    /// When the login happened
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from login response headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies: Vec<SessionCookie> = Vec::new();
        for value in headers.get_all(SET_COOKIE) {
            let Some(cookie) = value.to_str().ok().and_then(SessionCookie::parse) else {
                continue;
            };
            // A later Set-Cookie with the same name wins.
            cookies.retain(|c| c.name != cookie.name);
            cookies.push(cookie);
        }
        Self {
            cookies,
            created_at: Utc::now(),
        }
    }

    /// Value for a `Cookie` request header, or None when there are no cookies
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_parse_set_cookie() {
        let c = SessionCookie::parse("JSESSIONID=ABC123; Path=/; HttpOnly").unwrap();
        assert_eq!(c.name, "JSESSIONID");
        assert_eq!(c.value, "ABC123");

        assert!(SessionCookie::parse("no-equals-sign").is_none());
        assert!(SessionCookie::parse("=orphan").is_none());
    }

    #[test]
    fn test_session_from_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=one; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("READONLY=x; Secure"));
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=two; Path=/"));

        let session = Session::from_headers(&headers);
        assert_eq!(session.cookies.len(), 2);
        assert_eq!(
            session.cookie_header().unwrap(),
            HeaderValue::from_static("READONLY=x; JSESSIONID=two")
        );
    }

    #[test]
    fn test_empty_session_has_no_header() {
        let session = Session::from_headers(&HeaderMap::new());
        assert!(session.cookie_header().is_none());
    }

    #[test]
    fn test_auth_status_parse() {
        let ok = AuthStatus::parse(r#"{"status":"success","message":"Successful Login"}"#)
            .unwrap();
        assert!(!ok.is_error());

        let bad = AuthStatus::parse("status: error\nmessage: Invalid login\n").unwrap();
        assert!(bad.is_error());
        assert_eq!(bad.message, "Invalid login");
    }
}
