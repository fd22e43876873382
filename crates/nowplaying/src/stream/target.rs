//! Stream target and ICY request
//!
//! Splits a stream URL into what the raw socket needs and renders the
//! minimal HTTP/1.0 request that asks the server for inline metadata.

use base64::Engine;
use url::Url;

use crate::config::network::USER_AGENT;
use crate::error::{RadioError, Result};

/// Transport used to reach the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Everything needed to open a socket and talk ICY to a stream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub scheme: Scheme,
    /// Hostname as written in the URL (IPv6 literals keep their brackets)
    pub host: String,
    pub port: u16,
    /// Path plus query string
    pub path: String,
    credentials: Option<(String, String)>,
}

impl StreamTarget {
    /// Parse a stream URL.
    ///
    /// Fails with `InvalidUrl` for unparseable input and `UnknownProtocol`
    /// for anything but http/https.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;

        let scheme = match parsed.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(RadioError::UnknownProtocol(format!("{other}:"))),
        };

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RadioError::InvalidUrl(format!("{url}: missing host")))?
            .to_string();

        let port = parsed.port_or_known_default().unwrap_or(match scheme {
            Scheme::Http => 80,
            Scheme::Https => 443,
        });

        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }

        let credentials = if parsed.username().is_empty() {
            None
        } else {
            Some((
                percent_decode(parsed.username()),
                percent_decode(parsed.password().unwrap_or("")),
            ))
        };

        Ok(Self {
            scheme,
            host,
            port,
            path,
            credentials,
        })
    }

    /// Host without IPv6 brackets, for socket connect and TLS SNI
    pub fn connect_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Base64 `user:pass` for the Authorization header, when the URL has userinfo
    pub fn basic_auth(&self) -> Option<String> {
        self.credentials.as_ref().map(|(user, pass)| {
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"))
        })
    }

    /// Render the ICY request.
    ///
    /// Plain HTTP/1.0 so the server never switches to chunked encoding.
    pub fn request(&self) -> String {
        let mut request = format!(
            "GET {} HTTP/1.0\r\nIcy-Metadata: 1\r\nUser-Agent: {}\r\nHost: {}\r\n",
            self.path, USER_AGENT, self.host
        );
        if let Some(auth) = self.basic_auth() {
            request.push_str(&format!("Authorization: Basic {auth}\r\n"));
        }
        request.push_str("\r\n");
        request
    }
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
