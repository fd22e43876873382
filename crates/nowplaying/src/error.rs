//! Error types for nowplaying
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for station lookups
#[derive(Error, Debug)]
pub enum RadioError {
    #[error("{}", friendly_network_error(.0))]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown protocol: {0}. Unable to fetch stream.")]
    UnknownProtocol(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Redirect loop detected. {from} -> {to}")]
    RedirectLoop { from: String, to: String },

    #[error("Server returned an HTML page instead of a stream")]
    HtmlErrorPage,

    #[error("Error fetching stream: no metadata within {0} characters")]
    BufferOverflow(usize),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Handler fault: {0}")]
    HandlerFault(String),
}

impl From<url::ParseError> for RadioError {
    fn from(e: url::ParseError) -> Self {
        RadioError::InvalidUrl(e.to_string())
    }
}

/// Result type alias for nowplaying
pub type Result<T> = std::result::Result<T, RadioError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_builder() {
        if let Some(url) = e.url() {
            return format!("Invalid URL: {url}");
        }
        return "Invalid URL".to_string();
    }
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Connection timed out".to_string();
    }
    if e.is_decode() {
        return "Invalid response from server".to_string();
    }
    format!("Network error: {e}")
}
