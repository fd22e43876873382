//! Configuration constants for the nowplaying engine

/// Network-related configuration
pub mod network {
    /// User agent sent by the raw ICY request and the HTTP client
    pub const USER_AGENT: &str = concat!("nowplaying/", env!("CARGO_PKG_VERSION"));

    /// Browser-like user agent for Shoutcast v1, which serves audio to anything else
    pub const BROWSER_USER_AGENT: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    /// Connection timeout in seconds (HTML/JSON handlers)
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Read timeout in seconds (HTML/JSON handlers)
    pub const READ_TIMEOUT_SECS: u64 = 10;
}

/// Raw ICY stream configuration
pub mod stream {
    /// Deadline for a single stream attempt, connect included (milliseconds)
    pub const STREAM_TIMEOUT_MS: u64 = 5000;

    /// Maximum response buffer size, in decoded characters, before giving up
    pub const MAX_BUFFER_SIZE: usize = 100_000;

    /// Chunk size for socket reads (bytes)
    pub const READ_CHUNK_SIZE: usize = 8 * 1024;

    /// Capacity of the reader thread → engine event channel
    pub const EVENT_CHANNEL_BOUND: usize = 32;
}
