//! Icecast status page
//!
//! Icecast 2.4+ exposes every mount point at `/status-json.xsl`.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::stream::metadata::fix_track_title;
use crate::stream::types::{FetchSource, StationInfo};

use super::http::HttpClient;
use super::{json_u32, server_url, Lookup, StationHandler};

#[derive(Debug, Deserialize)]
struct StatusDocument {
    icestats: IceStats,
}

#[derive(Debug, Deserialize)]
struct IceStats {
    /// A single object when one mount is live, an array otherwise
    #[serde(default)]
    source: Option<Value>,
}

/// Icecast `/status-json.xsl` client
pub struct Icecast {
    client: HttpClient,
}

impl Icecast {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }

    pub fn status_url(url: &Url) -> Url {
        server_url(url, "/status-json.xsl")
    }
}

impl StationHandler for Icecast {
    fn source(&self) -> FetchSource {
        FetchSource::Icecast
    }

    fn resolve(&self, url: &str) -> Result<Lookup> {
        let stream_url = Url::parse(url)?;
        let status_url = Self::status_url(&stream_url);
        debug!(url = %status_url, "Icecast lookup");

        let doc = match self.client.get_json::<StatusDocument>(status_url.as_str()) {
            Ok(doc) => doc,
            Err(e) => return Ok(Lookup::Failed(e)),
        };
        let sources = doc.icestats.source.map(flatten_sources).unwrap_or_default();
        Ok(station_for_mount(&sources, stream_url.path()).map_or(Lookup::Empty, Lookup::Found))
    }
}

fn flatten_sources(source: Value) -> Vec<Value> {
    match source {
        Value::Array(list) => list,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

/// Pick the source serving `mount` (falling back to the first) and read its title
pub fn station_for_mount(sources: &[Value], mount: &str) -> Option<StationInfo> {
    let source = sources
        .iter()
        .find(|s| listen_path(s).as_deref() == Some(mount))
        .or_else(|| sources.first())?;

    let title = source_title(source)?;
    let mut info = StationInfo::new(title, FetchSource::Icecast);
    info.listeners = source.get("listeners").and_then(json_u32);
    info.bitrate = source
        .get("bitrate")
        .or_else(|| source.get("audio_bitrate"))
        .and_then(json_u32);
    Some(info)
}

fn listen_path(source: &Value) -> Option<String> {
    let listen_url = source.get("listenurl")?.as_str()?;
    Url::parse(listen_url).ok().map(|u| u.path().to_string())
}

fn source_title(source: &Value) -> Option<String> {
    let field = |name: &str| {
        source
            .get(name)
            .and_then(Value::as_str)
            .map(fix_track_title)
            .filter(|s| !s.is_empty())
    };

    let raw = match (field("artist"), field("title")) {
        (Some(artist), Some(title)) => format!("{artist} - {title}"),
        (None, Some(title)) => title,
        _ => field("yp_currently_playing")?,
    };
    Some(raw)
}
