//! Station types
//!
//! The normalized result shared by every protocol handler.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RadioError;

/// Protocol a station descriptor was fetched with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FetchSource {
    #[serde(rename = "SHOUTCAST_V1")]
    ShoutcastV1,
    #[serde(rename = "SHOUTCAST_V2")]
    ShoutcastV2,
    #[serde(rename = "ICECAST")]
    Icecast,
    #[serde(rename = "STREAM")]
    Stream,
}

impl FetchSource {
    /// Fixed fallback order used when no protocol is requested
    pub const PROBE_ORDER: [FetchSource; 4] = [
        FetchSource::ShoutcastV1,
        FetchSource::ShoutcastV2,
        FetchSource::Icecast,
        FetchSource::Stream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchSource::ShoutcastV1 => "SHOUTCAST_V1",
            FetchSource::ShoutcastV2 => "SHOUTCAST_V2",
            FetchSource::Icecast => "ICECAST",
            FetchSource::Stream => "STREAM",
        }
    }
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchSource {
    type Err = RadioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHOUTCAST_V1" => Ok(FetchSource::ShoutcastV1),
            "SHOUTCAST_V2" => Ok(FetchSource::ShoutcastV2),
            "ICECAST" => Ok(FetchSource::Icecast),
            "STREAM" => Ok(FetchSource::Stream),
            other => Err(RadioError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Now-playing descriptor for a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationInfo {
    pub title: String,
    pub fetchsource: FetchSource,
    /// Selected response headers, lowercase keys (raw stream lookups only)
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listeners: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
}

impl StationInfo {
    /// Descriptor carrying only a title
    pub fn new(title: impl Into<String>, fetchsource: FetchSource) -> Self {
        Self {
            title: title.into(),
            fetchsource,
            headers: BTreeMap::new(),
            listeners: None,
            bitrate: None,
        }
    }
}
