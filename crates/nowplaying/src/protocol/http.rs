//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! user agent and timeout configuration for the admin-page handlers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{RadioError, Result};

/// Blocking HTTP client with standard configuration
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a client with the default user agent
    pub fn new() -> Result<Self> {
        Self::with_user_agent(USER_AGENT)
    }

    /// Create a client that identifies itself as `user_agent`
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// GET a URL and return the body as text; non-2xx is an error
    pub fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.inner.get(url).send()?;
        if !resp.status().is_success() {
            return Err(RadioError::Stream(format!("HTTP {}", resp.status())));
        }
        Ok(resp.text()?)
    }

    /// GET a URL and deserialize the JSON response
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body)
            .map_err(|e| RadioError::Stream(format!("Invalid JSON from {url}: {e}")))
    }
}
