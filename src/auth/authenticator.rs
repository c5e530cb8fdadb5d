//! Authenticator implementation
//!
//! Logs in against `authenticate.sjs` and stamps the resulting session
//! cookies onto outgoing requests.

use super::types::{AuthStatus, Session};
use crate::config::Credentials;
use crate::error::{Error, Result};
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Authenticator handles session login and applies the session to requests
pub struct Authenticator {
    /// Login credentials
    credentials: Credentials,
    /// Session captured at login
    session: Arc<RwLock<Option<Session>>>,
    /// HTTP client for the login request
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(credentials: Credentials, http_client: Client) -> Self {
        Self {
            credentials,
            session: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Base URL derived from the credentials' host
    pub fn base_url(&self) -> String {
        self.credentials.base_url()
    }

    /// Log in and keep the session cookies
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/api/authenticate.sjs", self.base_url());
        debug!("Authenticating {} at {}", self.credentials.email, url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("json", ""),
                ("email", self.credentials.email.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let session = Session::from_headers(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(Error::auth(format!(
                "Login request failed with status {}: {body}",
                status.as_u16()
            )));
        }

        let auth_status = AuthStatus::parse(&body).ok_or_else(|| {
            Error::auth(format!("Unreadable login response: {}", excerpt(&body)))
        })?;
        if auth_status.is_error() {
            return Err(Error::auth(auth_status.message));
        }

        info!(
            host = %self.credentials.host,
            cookies = session.cookies.len(),
            "Authenticated"
        );
        *self.session.write().await = Some(session);
        Ok(())
    }

    /// Check whether a session exists
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Apply the session cookies to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let session = self.session.read().await;
        let session = session.as_ref().ok_or(Error::NotAuthenticated)?;
        match session.cookie_header() {
            Some(value) => Ok(req.header(COOKIE, value)),
            None => Ok(req),
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// First part of a body for error messages
pub(crate) fn excerpt(body: &str) -> &str {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        return body;
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
