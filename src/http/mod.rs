//! HTTP client module
//!
//! Every CRM call goes through `HttpClient`, which carries the login
//! session cookies, throttles requests and turns bad statuses into errors.
//! Retries are available but off by default.

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
