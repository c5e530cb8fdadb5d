//! Authenticated API handle

use super::table::Table;
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpClient;
use tracing::info;

/// Handle on one CRM instance
///
/// Clones share the HTTP client, the session and the rate limiter.
#[derive(Debug, Clone)]
pub struct Api {
    http: HttpClient,
}

impl Api {
    /// Log in with the configured credentials
    pub async fn connect(config: &Config) -> Result<Self> {
        let base_url = config.credentials.base_url();
        let http = HttpClient::with_credentials(
            config.http.client_config(&base_url),
            config.credentials.clone(),
        )?;
        http.authenticate().await?;
        info!(host = %config.credentials.host, "Connected");
        Ok(Self { http })
    }

    /// Wrap a client that is already set up
    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Table by object name
    pub fn table(&self, name: impl Into<String>) -> Table {
        Table::new(self.clone(), name)
    }

    pub fn donation(&self) -> Table {
        self.table("donation")
    }

    pub fn email(&self) -> Table {
        self.table("email")
    }

    pub fn email_blast(&self) -> Table {
        self.table("email_blast")
    }

    /// `groups`, the only plural table name
    pub fn groups(&self) -> Table {
        self.table("groups")
    }

    /// Groups joined to their supporters. Read with `left_join`.
    pub fn groups_supporters(&self) -> Table {
        self.table("groups(groups_KEY)supporter_groups(supporter_KEY)supporter")
    }

    pub fn organization(&self) -> Table {
        self.table("organization")
    }

    pub fn supporter(&self) -> Table {
        self.table("supporter")
    }

    /// Supporters joined to their donations. Read with `left_join`.
    pub fn supporter_donation(&self) -> Table {
        self.table("supporter(supporter_KEY)donation")
    }

    pub fn supporter_groups(&self) -> Table {
        self.table("supporter_groups")
    }

    pub fn publish(&self) -> Table {
        self.table("publish")
    }
}
