//! Station resolver
//!
//! Runs one protocol handler when the caller names a protocol, otherwise
//! probes them one after another in a fixed order until one finds the
//! station.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::{RadioError, Result};
use crate::protocol::{Lookup, ProtocolHandler, StationHandler};
use crate::stream::types::{FetchSource, StationInfo};

/// Resolves a stream URL into a `StationInfo`
#[derive(Clone)]
pub struct StationResolver {
    handlers: Arc<Vec<Box<dyn StationHandler>>>,
}

impl StationResolver {
    /// Resolver with the built-in handlers in probe order
    pub fn new() -> Result<Self> {
        let handlers = FetchSource::PROBE_ORDER
            .iter()
            .map(|&source| {
                ProtocolHandler::for_source(source)
                    .map(|h| Box::new(h) as Box<dyn StationHandler>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_handlers(handlers))
    }

    /// Resolver over an arbitrary handler list; list order is probe order
    pub fn from_handlers(handlers: Vec<Box<dyn StationHandler>>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Look up the station behind `url`.
    ///
    /// With a `method`, only that handler runs and its report is returned
    /// as-is. Without one, handlers are probed in order:
    /// - a found station ends the probe
    /// - an empty result or a reported failure moves on to the next handler
    /// - a handler that cannot be invoked at all aborts the probe with its error
    ///
    /// `Ok(None)` means every handler came back empty.
    pub fn resolve(&self, url: &str, method: Option<FetchSource>) -> Result<Option<StationInfo>> {
        match method {
            Some(source) => self.resolve_with(url, source),
            None => self.probe(url),
        }
    }

    /// Run `resolve` on a worker thread and hand the result to `callback`.
    ///
    /// The callback runs exactly once, on the worker thread.
    pub fn spawn<F>(&self, url: &str, method: Option<FetchSource>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Option<StationInfo>>) + Send + 'static,
    {
        let resolver = self.clone();
        let url = url.to_string();
        thread::spawn(move || callback(resolver.resolve(&url, method)))
    }

    fn resolve_with(&self, url: &str, source: FetchSource) -> Result<Option<StationInfo>> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.source() == source)
            .ok_or_else(|| RadioError::UnknownProtocol(source.to_string()))?;

        debug!(url, %source, "resolving with explicit protocol");
        handler.resolve(url)?.into_result()
    }

    fn probe(&self, url: &str) -> Result<Option<StationInfo>> {
        for handler in self.handlers.iter() {
            let source = handler.source();
            let lookup = match handler.resolve(url) {
                Ok(lookup) => lookup,
                Err(e) => {
                    warn!(url, %source, error = %e, "handler fault, aborting probe");
                    return Err(e);
                }
            };

            match lookup {
                Lookup::Found(info) => {
                    debug!(url, %source, title = %info.title, "station found");
                    return Ok(Some(info));
                }
                Lookup::Empty => debug!(url, %source, "no station, trying next protocol"),
                Lookup::Failed(e) => {
                    debug!(url, %source, error = %e, "lookup failed, trying next protocol")
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    const URL: &str = "http://stream.example.com:8000/";

    #[derive(Clone, Copy)]
    enum Reply {
        Found,
        Empty,
        Failed,
        Fault,
    }

    /// Handler that answers from a script and counts invocations
    struct Scripted {
        source: FetchSource,
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    impl StationHandler for Scripted {
        fn source(&self) -> FetchSource {
            self.source
        }

        fn resolve(&self, _url: &str) -> Result<Lookup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Found => Ok(Lookup::Found(StationInfo::new(
                    format!("{} title", self.source),
                    self.source,
                ))),
                Reply::Empty => Ok(Lookup::Empty),
                Reply::Failed => Ok(Lookup::Failed(RadioError::Stream("HTTP 404".to_string()))),
                Reply::Fault => Err(RadioError::HandlerFault(format!("{} blew up", self.source))),
            }
        }
    }

    fn scripted(replies: [Reply; 4]) -> (StationResolver, Vec<Arc<AtomicUsize>>) {
        let mut counters = Vec::new();
        let handlers = FetchSource::PROBE_ORDER
            .iter()
            .zip(replies)
            .map(|(&source, reply)| {
                let calls = Arc::new(AtomicUsize::new(0));
                counters.push(calls.clone());
                Box::new(Scripted {
                    source,
                    reply,
                    calls,
                }) as Box<dyn StationHandler>
            })
            .collect();
        (StationResolver::from_handlers(handlers), counters)
    }

    fn calls(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    // --- fallback probing ---

    #[test]
    fn all_empty_yields_none() {
        let (resolver, counters) = scripted([Reply::Empty; 4]);
        assert_eq!(resolver.resolve(URL, None).unwrap(), None);
        assert_eq!(calls(&counters), vec![1, 1, 1, 1]);
    }

    #[test]
    fn first_hit_stops_probe() {
        let (resolver, counters) =
            scripted([Reply::Empty, Reply::Found, Reply::Found, Reply::Found]);
        let info = resolver.resolve(URL, None).unwrap().unwrap();
        assert_eq!(info.fetchsource, FetchSource::ShoutcastV2);
        assert_eq!(calls(&counters), vec![1, 1, 0, 0]);
    }

    #[test]
    fn reported_failures_are_treated_as_empty() {
        let (resolver, counters) =
            scripted([Reply::Failed, Reply::Failed, Reply::Failed, Reply::Found]);
        let info = resolver.resolve(URL, None).unwrap().unwrap();
        assert_eq!(info.fetchsource, FetchSource::Stream);
        assert_eq!(calls(&counters), vec![1, 1, 1, 1]);
    }

    #[test]
    fn all_failed_yields_none() {
        let (resolver, _) = scripted([Reply::Failed; 4]);
        assert_eq!(resolver.resolve(URL, None).unwrap(), None);
    }

    #[test]
    fn fault_aborts_probe() {
        let (resolver, counters) =
            scripted([Reply::Empty, Reply::Empty, Reply::Fault, Reply::Found]);
        let err = resolver.resolve(URL, None).unwrap_err();
        assert!(matches!(err, RadioError::HandlerFault(ref m) if m == "ICECAST blew up"));
        assert_eq!(calls(&counters), vec![1, 1, 1, 0]);
    }

    // --- explicit protocol ---

    #[test]
    fn explicit_method_runs_only_that_handler() {
        let (resolver, counters) = scripted([Reply::Found; 4]);
        let info = resolver
            .resolve(URL, Some(FetchSource::Icecast))
            .unwrap()
            .unwrap();
        assert_eq!(info.fetchsource, FetchSource::Icecast);
        assert_eq!(calls(&counters), vec![0, 0, 1, 0]);
    }

    #[test]
    fn explicit_method_forwards_failure() {
        let (resolver, counters) =
            scripted([Reply::Failed, Reply::Found, Reply::Found, Reply::Found]);
        let err = resolver
            .resolve(URL, Some(FetchSource::ShoutcastV1))
            .unwrap_err();
        assert!(matches!(err, RadioError::Stream(_)));
        assert_eq!(calls(&counters), vec![1, 0, 0, 0]);
    }

    #[test]
    fn explicit_method_forwards_empty() {
        let (resolver, _) = scripted([Reply::Found, Reply::Found, Reply::Found, Reply::Empty]);
        assert_eq!(resolver.resolve(URL, Some(FetchSource::Stream)).unwrap(), None);
    }

    #[test]
    fn explicit_method_forwards_fault() {
        let (resolver, _) = scripted([Reply::Fault; 4]);
        assert!(matches!(
            resolver.resolve(URL, Some(FetchSource::ShoutcastV2)),
            Err(RadioError::HandlerFault(_))
        ));
    }

    #[test]
    fn explicit_method_without_handler() {
        let resolver = StationResolver::from_handlers(Vec::new());
        assert!(matches!(
            resolver.resolve(URL, Some(FetchSource::Stream)),
            Err(RadioError::UnknownProtocol(_))
        ));
        assert_eq!(resolver.resolve(URL, None).unwrap(), None);
    }

    // --- callback form ---

    #[test]
    fn spawn_invokes_callback_once() {
        let (resolver, _) = scripted([Reply::Empty, Reply::Empty, Reply::Found, Reply::Empty]);
        let (tx, rx) = mpsc::channel();
        resolver
            .spawn(URL, None, move |result| {
                tx.send(result.map(|info| info.map(|i| i.fetchsource))).unwrap();
            })
            .join()
            .unwrap();

        let received = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(received.unwrap(), Some(FetchSource::Icecast));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn default_resolver_has_all_protocols() {
        let resolver = StationResolver::new().unwrap();
        let sources: Vec<_> = resolver.handlers.iter().map(|h| h.source()).collect();
        assert_eq!(sources, FetchSource::PROBE_ORDER.to_vec());
    }
}
