//! HTTP client construction
//!
//! One pooled client per [`ApiClient`](crate::api::ApiClient), built here so
//! the timeout and user agent are set in a single place. The client is an
//! injected value, never a process global.

use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "mediplant-rs/1.0";

/// Build the shared HTTP client with the configured transport timeout.
///
/// A timeout here surfaces downstream as a transient
/// [`SearchError`](crate::error::SearchError).
#[must_use]
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client - this should never fail")
}
