//! Raw stream connection
//!
//! A background thread connects (plain TCP or TLS), writes the ICY request
//! and forwards everything it reads as `SocketEvent`s. The engine owns the
//! `Connection` guard; dropping it stops the thread and destroys the socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::config::stream::{EVENT_CHANNEL_BOUND, READ_CHUNK_SIZE};
use crate::error::{RadioError, Result};
use crate::stream::target::{Scheme, StreamTarget};

/// Something that happened on the socket
#[derive(Debug)]
pub enum SocketEvent {
    /// Connected and request written
    Connected,
    Data(Vec<u8>),
    /// Server closed the connection
    Closed,
    Error(RadioError),
}

/// Exclusive handle on one stream socket and its reader thread
pub struct Connection {
    events: Receiver<SocketEvent>,
    socket: Arc<Mutex<Option<TcpStream>>>,
    stop_flag: Arc<AtomicBool>,
    _handle: Option<JoinHandle<()>>,
}

impl Connection {
    /// Start connecting to `target` in the background.
    ///
    /// `connect_timeout` bounds the TCP connect itself; overall progress is
    /// bounded by the caller's deadline.
    pub fn open(target: &StreamTarget, connect_timeout: Duration) -> Result<Self> {
        let (tx, rx) = bounded::<SocketEvent>(EVENT_CHANNEL_BOUND);
        let socket = Arc::new(Mutex::new(None));
        let stop_flag = Arc::new(AtomicBool::new(false));

        let target = target.clone();
        let socket_clone = socket.clone();
        let stop_clone = stop_flag.clone();
        let handle = thread::Builder::new()
            .name("icy-reader".to_string())
            .spawn(move || {
                if let Err(e) = pump(&target, connect_timeout, &tx, &socket_clone, &stop_clone) {
                    if !stop_clone.load(Ordering::SeqCst) {
                        let _ = tx.send(SocketEvent::Error(e));
                    }
                }
            })?;

        Ok(Self {
            events: rx,
            socket,
            stop_flag,
            _handle: Some(handle),
        })
    }

    /// Wait for the next event until `deadline`
    pub fn recv_deadline(
        &self,
        deadline: Instant,
    ) -> std::result::Result<SocketEvent, RecvTimeoutError> {
        self.events.recv_deadline(deadline)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = self.socket.lock() {
            if let Some(stream) = slot.take() {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    }
}

/// Reader thread body: connect, send the request, forward reads.
fn pump(
    target: &StreamTarget,
    connect_timeout: Duration,
    events: &Sender<SocketEvent>,
    socket: &Mutex<Option<TcpStream>>,
    stop_flag: &AtomicBool,
) -> Result<()> {
    let tcp = connect_tcp(target, connect_timeout)?;

    // Publish a handle before checking the stop flag so that Drop either
    // sees the socket or we see the flag.
    if let Ok(mut slot) = socket.lock() {
        *slot = Some(tcp.try_clone()?);
    }
    if stop_flag.load(Ordering::SeqCst) {
        return Ok(());
    }

    let request = target.request();
    match target.scheme {
        Scheme::Http => forward(tcp, &request, events, stop_flag),
        Scheme::Https => {
            let connector = native_tls::TlsConnector::new()?;
            let tls = connector
                .connect(target.connect_host(), tcp)
                .map_err(|e| match e {
                    native_tls::HandshakeError::Failure(e) => RadioError::Tls(e),
                    native_tls::HandshakeError::WouldBlock(_) => RadioError::Io(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        "TLS handshake interrupted",
                    )),
                })?;
            forward(tls, &request, events, stop_flag)
        }
    }
}

fn connect_tcp(target: &StreamTarget, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in (target.connect_host(), target.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err
        .unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {}", target.host),
            )
        })
        .into())
}

fn forward<S: Read + Write>(
    mut stream: S,
    request: &str,
    events: &Sender<SocketEvent>,
    stop_flag: &AtomicBool,
) -> Result<()> {
    stream.write_all(request.as_bytes())?;
    stream.flush()?;
    if events.send(SocketEvent::Connected).is_err() {
        return Ok(());
    }

    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        if stop_flag.load(Ordering::SeqCst) {
            return Ok(());
        }
        match stream.read(&mut chunk) {
            Ok(0) => {
                let _ = events.send(SocketEvent::Closed);
                return Ok(());
            }
            Ok(n) => {
                if events.send(SocketEvent::Data(chunk[..n].to_vec())).is_err() {
                    return Ok(());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // TLS peers that skip close_notify
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                let _ = events.send(SocketEvent::Closed);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}
