//! Stream handling
//!
//! Opens the audio stream itself over a raw socket, asks for ICY metadata
//! and scrapes the response head for a `StreamTitle`. Also holds the shared
//! station types and the title fix-up used by every protocol handler.

pub mod buffer;
pub mod icy;
pub mod metadata;
pub mod scan;
pub mod target;
pub mod transport;
pub mod types;

pub use icy::IcyStream;
pub use metadata::fix_track_title;
pub use types::{FetchSource, StationInfo};
