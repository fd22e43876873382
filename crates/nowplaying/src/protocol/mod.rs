//! Protocol handlers
//!
//! Every way of asking a server what it is playing implements
//! `StationHandler`. The resolver only ever talks to that trait.

pub mod http;
pub mod icecast;
pub mod shoutcast;

use serde_json::Value;
use url::Url;

use crate::error::{RadioError, Result};
use crate::stream::icy::IcyStream;
use crate::stream::types::{FetchSource, StationInfo};

pub use http::HttpClient;
pub use icecast::Icecast;
pub use shoutcast::{ShoutcastV1, ShoutcastV2};

/// What a handler reported for one URL
#[derive(Debug)]
pub enum Lookup {
    Found(StationInfo),
    /// The server answered but has nothing to say about this station
    Empty,
    /// The lookup ran and failed
    Failed(RadioError),
}

impl Lookup {
    pub fn into_result(self) -> Result<Option<StationInfo>> {
        match self {
            Lookup::Found(info) => Ok(Some(info)),
            Lookup::Empty => Ok(None),
            Lookup::Failed(e) => Err(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl From<Result<Option<StationInfo>>> for Lookup {
    fn from(result: Result<Option<StationInfo>>) -> Self {
        match result {
            Ok(Some(info)) => Lookup::Found(info),
            Ok(None) => Lookup::Empty,
            Err(e) => Lookup::Failed(e),
        }
    }
}

/// A way of resolving now-playing metadata for a stream URL
///
/// `Ok(lookup)` is what the handler reported, including failures.
/// `Err(_)` means the handler could not be invoked at all.
pub trait StationHandler: Send + Sync {
    /// Protocol this handler speaks
    fn source(&self) -> FetchSource;

    /// Look up the station behind `url`
    fn resolve(&self, url: &str) -> Result<Lookup>;
}

/// The built-in handlers, one per protocol
pub enum ProtocolHandler {
    ShoutcastV1(ShoutcastV1),
    ShoutcastV2(ShoutcastV2),
    Icecast(Icecast),
    Stream(IcyStream),
}

impl ProtocolHandler {
    /// Build the default handler for a protocol
    pub fn for_source(source: FetchSource) -> Result<Self> {
        Ok(match source {
            FetchSource::ShoutcastV1 => ProtocolHandler::ShoutcastV1(ShoutcastV1::new()?),
            FetchSource::ShoutcastV2 => ProtocolHandler::ShoutcastV2(ShoutcastV2::new()?),
            FetchSource::Icecast => ProtocolHandler::Icecast(Icecast::new()?),
            FetchSource::Stream => ProtocolHandler::Stream(IcyStream::new()),
        })
    }

    fn inner(&self) -> &dyn StationHandler {
        match self {
            ProtocolHandler::ShoutcastV1(h) => h,
            ProtocolHandler::ShoutcastV2(h) => h,
            ProtocolHandler::Icecast(h) => h,
            ProtocolHandler::Stream(h) => h,
        }
    }
}

impl StationHandler for ProtocolHandler {
    fn source(&self) -> FetchSource {
        self.inner().source()
    }

    fn resolve(&self, url: &str) -> Result<Lookup> {
        self.inner().resolve(url)
    }
}

/// Same server as `url`, different path (query and fragment dropped)
pub(crate) fn server_url(url: &Url, path: &str) -> Url {
    let mut admin = url.clone();
    admin.set_path(path);
    admin.set_query(None);
    admin.set_fragment(None);
    admin
}

/// Read a count that servers send either as a number or as a numeric string
pub(crate) fn json_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
