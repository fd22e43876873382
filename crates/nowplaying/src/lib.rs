//! Nowplaying — Internet Radio Metadata
//!
//! Finds out what an internet radio station is playing right now. Knows how
//! to ask Shoutcast v1 and v2 servers, Icecast servers and, as a last resort,
//! the audio stream itself via ICY metadata.
//!
//! ## Quick start
//!
//! ```no_run
//! use nowplaying::{get_station_info, FetchSource};
//!
//! // Probe every protocol in turn
//! if let Some(info) = get_station_info("http://radio.example:8000/stream", None)? {
//!     println!("{} ({})", info.title, info.fetchsource);
//! }
//!
//! // Or ask one protocol only
//! let info = get_station_info("http://radio.example:8000/stream", Some(FetchSource::Icecast))?;
//! # let _ = info;
//! # Ok::<(), nowplaying::RadioError>(())
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod resolver;
pub mod stream;

pub use error::{RadioError, Result};
pub use protocol::{Lookup, ProtocolHandler, StationHandler};
pub use resolver::StationResolver;
pub use stream::{fix_track_title, FetchSource, IcyStream, StationInfo};

/// Resolve the station behind `url` with the built-in handlers.
///
/// See [`StationResolver::resolve`] for how `method` changes the lookup.
pub fn get_station_info(url: &str, method: Option<FetchSource>) -> Result<Option<StationInfo>> {
    StationResolver::new()?.resolve(url, method)
}
