//! ICY stream engine
//!
//! Asks a stream server for inline metadata over a raw socket and scans the
//! response text until a `StreamTitle` shows up. Each attempt is a small
//! state machine fed by socket events and a deadline; the first terminal
//! event wins and everything after it is ignored.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, trace};
use url::Url;

use crate::config::stream::{MAX_BUFFER_SIZE, STREAM_TIMEOUT_MS};
use crate::error::{RadioError, Result};
use crate::protocol::{Lookup, StationHandler};
use crate::stream::buffer::ResponseBuffer;
use crate::stream::metadata::fix_track_title;
use crate::stream::scan;
use crate::stream::target::StreamTarget;
use crate::stream::transport::{Connection, SocketEvent};
use crate::stream::types::{FetchSource, StationInfo};

/// Raw-socket ICY metadata fetcher
#[derive(Debug, Clone)]
pub struct IcyStream {
    timeout: Duration,
    max_buffer: usize,
}

impl Default for IcyStream {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(STREAM_TIMEOUT_MS),
            max_buffer: MAX_BUFFER_SIZE,
        }
    }
}

impl IcyStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-attempt deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the response buffer cap (decoded characters)
    pub fn with_max_buffer(mut self, chars: usize) -> Self {
        self.max_buffer = chars;
        self
    }

    /// Fetch the current title of the stream at `url`.
    ///
    /// Follows `Location` redirects. Each hop is a fresh attempt with its own
    /// socket, buffer and deadline.
    pub fn fetch(&self, url: &str) -> Result<StationInfo> {
        let mut current = url.to_string();
        loop {
            match self.attempt(&current, url) {
                Outcome::Station(info) => return Ok(info),
                Outcome::Failed(e) => {
                    debug!(url = %current, error = %e, "stream lookup failed");
                    return Err(e);
                }
                Outcome::Redirect(next) => {
                    debug!(from = %current, to = %next, "following stream redirect");
                    current = next;
                }
            }
        }
    }

    /// One connection, start to terminal event.
    ///
    /// The `Connection` is dropped on return, which tears the socket down.
    fn attempt(&self, url: &str, original: &str) -> Outcome {
        let deadline = Instant::now() + self.timeout;
        debug!(url, "stream attempt");

        let target = match StreamTarget::parse(url) {
            Ok(target) => target,
            Err(e) => return Outcome::Failed(e),
        };
        let connection = match Connection::open(&target, self.timeout) {
            Ok(connection) => connection,
            Err(e) => return Outcome::Failed(e),
        };

        let mut machine = IcyAttempt::new(url, original, self.max_buffer);
        loop {
            let event = match connection.recv_deadline(deadline) {
                Ok(socket_event) => Event::Socket(socket_event),
                Err(RecvTimeoutError::Timeout) => Event::DeadlineElapsed,
                Err(RecvTimeoutError::Disconnected) => {
                    // Reader is gone without a verdict; only the deadline is left
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    Event::DeadlineElapsed
                }
            };
            if let Some(outcome) = machine.handle(event) {
                return outcome;
            }
        }
    }
}

impl StationHandler for IcyStream {
    fn source(&self) -> FetchSource {
        FetchSource::Stream
    }

    fn resolve(&self, url: &str) -> Result<Lookup> {
        Url::parse(url)?;
        Ok(match self.fetch(url) {
            Ok(info) => Lookup::Found(info),
            Err(e) => Lookup::Failed(e),
        })
    }
}

/// Input to an attempt
#[derive(Debug)]
pub(crate) enum Event {
    Socket(SocketEvent),
    DeadlineElapsed,
}

/// Terminal result of an attempt
#[derive(Debug)]
pub(crate) enum Outcome {
    Station(StationInfo),
    /// Start over against this URL
    Redirect(String),
    Failed(RadioError),
}

#[derive(Debug)]
enum State {
    Connecting,
    Buffering(ResponseBuffer),
    Completed,
}

/// Lifecycle of a single attempt.
///
/// `handle` returns `Some` exactly once; a `Completed` attempt ignores
/// every later event.
pub(crate) struct IcyAttempt<'a> {
    url: &'a str,
    original: &'a str,
    max_buffer: usize,
    state: State,
}

impl<'a> IcyAttempt<'a> {
    pub(crate) fn new(url: &'a str, original: &'a str, max_buffer: usize) -> Self {
        Self {
            url,
            original,
            max_buffer,
            state: State::Connecting,
        }
    }

    pub(crate) fn is_completed(&self) -> bool {
        matches!(self.state, State::Completed)
    }

    pub(crate) fn handle(&mut self, event: Event) -> Option<Outcome> {
        if self.is_completed() {
            return None;
        }

        match event {
            Event::Socket(SocketEvent::Connected) => {
                if let State::Connecting = self.state {
                    self.state = State::Buffering(ResponseBuffer::new());
                }
                None
            }
            Event::Socket(SocketEvent::Data(bytes)) => self.on_data(&bytes),
            Event::Socket(SocketEvent::Closed) => self.on_close(),
            Event::Socket(SocketEvent::Error(e)) => Some(self.complete(Outcome::Failed(e))),
            Event::DeadlineElapsed => Some(self.complete(Outcome::Failed(RadioError::Timeout(
                "Attempting to fetch station data via stream timed out.".to_string(),
            )))),
        }
    }

    fn on_data(&mut self, bytes: &[u8]) -> Option<Outcome> {
        if let State::Connecting = self.state {
            self.state = State::Buffering(ResponseBuffer::new());
        }
        let State::Buffering(buffer) = &mut self.state else {
            return None;
        };

        buffer.push_bytes(bytes);
        trace!(received = bytes.len(), buffered = buffer.char_len(), "stream chunk");

        let station = scan::extract_title(buffer.as_str()).map(|raw| {
            let mut info = StationInfo::new(fix_track_title(raw), FetchSource::Stream);
            info.headers = scan::extract_headers(buffer.as_str());
            info
        });
        if let Some(info) = station {
            return Some(self.complete(Outcome::Station(info)));
        }

        if buffer.char_len() > self.max_buffer {
            let cap = self.max_buffer;
            return Some(self.complete(Outcome::Failed(RadioError::BufferOverflow(cap))));
        }
        None
    }

    fn on_close(&mut self) -> Option<Outcome> {
        let text = match &self.state {
            State::Buffering(buffer) => buffer.as_str(),
            _ => "",
        };

        let outcome = if let Some(location) = scan::find_redirect(text) {
            let next = resolve_location(self.url, location);
            if same_url(&next, self.original) {
                Outcome::Failed(RadioError::RedirectLoop {
                    from: self.original.to_string(),
                    to: next,
                })
            } else {
                Outcome::Redirect(next)
            }
        } else if scan::is_html_error_page(text) {
            Outcome::Failed(RadioError::HtmlErrorPage)
        } else {
            return None;
        };

        Some(self.complete(outcome))
    }

    /// Teardown: drop the buffer and refuse further events
    fn complete(&mut self, outcome: Outcome) -> Outcome {
        self.state = State::Completed;
        outcome
    }
}

/// Compare two URLs in parsed form, so `http://h:80` and `http://h/` match
fn same_url(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Absolute `Location` values are used verbatim; relative ones are joined
/// onto the URL that produced them.
fn resolve_location(current: &str, location: &str) -> String {
    if Url::parse(location).is_ok() {
        return location.to_string();
    }
    Url::parse(current)
        .and_then(|base| base.join(location))
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}
