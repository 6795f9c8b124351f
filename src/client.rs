//! Raw socket query/response client.
//!
//! This module implements the fixed query/response exchange used by devices
//! that expose a bare TCP socket instead of a standard instrument-control
//! protocol (GPIB, SCPI, VISA).
//!
//! # Protocol Overview
//!
//! The exchange is strictly half-duplex: the client writes a fixed query
//! payload, then performs exactly one bounded read for the reply. There is no
//! framing, no length prefix, no checksum. Payload content is opaque to this
//! crate; whatever the device writes back is returned verbatim.
//!
//! The single bounded read is a protocol assumption, not a guarantee: if the
//! device's reply exceeds the configured capacity, or straggles in across
//! multiple segments, the caller sees only the first available chunk.
//!
//! # Lifecycle
//!
//! ```text
//! unconnected --connect()--> connected --close()--> closed
//! ```
//!
//! All protocol operations require the *connected* state. A closed client
//! stays closed; resuming communication requires a new instance.
//!
//! # Example
//!
//! ```no_run
//! use sockpoll::SocketClient;
//!
//! let mut client = SocketClient::new("PING", 64)?;
//! client.connect("192.168.0.42", 5025)?;
//!
//! // One query/response exchange per call.
//! let reply = client.poll()?;
//! println!("device replied with {} bytes", reply.len());
//!
//! client.close();
//! # Ok::<(), sockpoll::ClientError>(())
//! ```

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

/// Query payload used when the caller has no device-specific query.
///
/// A single placeholder byte; most real devices will want their own query
/// sequence passed to [`SocketClient::new`].
pub const DEFAULT_QUERY: &[u8] = b"1";

/// Default bound on bytes requested per response read.
pub const DEFAULT_RESPONSE_CAPACITY: usize = 1000;

/// Errors that can occur during a socket exchange.
///
/// Nothing is retried or recovered internally; every failure surfaces to the
/// caller so polling loops can apply their own retry/backoff policy.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid construction parameters (zero response capacity).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Protocol operation attempted before `connect` or after `close`.
    #[error("client is not connected")]
    NotConnected,

    /// Failed to establish the TCP connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Transport-level failure during send or receive (reset, peer closed
    /// mid-write, or a configured timeout expiring).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Connection lifecycle of the owned transport.
enum Link<S> {
    Unconnected,
    Connected(S),
    Closed,
}

/// Synchronous client for polling a device over a raw byte stream.
///
/// A `SocketClient` owns exactly one transport plus two pieces of protocol
/// configuration fixed at construction: the query payload sent on every
/// [`poll`](Self::poll), and the capacity bound applied to every
/// [`receive`](Self::receive).
///
/// The client is generic over the transport so the exchange can be driven
/// against anything implementing [`Read`] + [`Write`]; production use is the
/// default [`TcpStream`] instantiation via [`new`](Self::new) and
/// [`connect`](Self::connect).
///
/// All operations block the calling thread. The client is not designed for
/// concurrent use; poll multiple devices with one client per device.
///
/// # Example
///
/// ```no_run
/// use sockpoll::{SocketClient, DEFAULT_QUERY, DEFAULT_RESPONSE_CAPACITY};
///
/// let mut client = SocketClient::new(DEFAULT_QUERY, DEFAULT_RESPONSE_CAPACITY)?;
/// client.connect("127.0.0.1", 1111)?;
///
/// // Steady-state sampling loop.
/// for _ in 0..10 {
///     let sample = client.poll()?;
///     println!("{sample:?}");
/// }
/// # Ok::<(), sockpoll::ClientError>(())
/// ```
pub struct SocketClient<S = TcpStream> {
    link: Link<S>,
    query: Vec<u8>,
    response_capacity: usize,
}

impl<S: Read + Write> SocketClient<S> {
    /// Create a client around an already-established transport.
    ///
    /// The transport is treated as live: the client starts in the *connected*
    /// state and [`poll`](Self::poll) may be called immediately. Useful for
    /// driving the exchange over a mock transport in tests, or over a stream
    /// the caller set up with non-default socket options.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if `response_capacity` is zero.
    pub fn with_transport(
        transport: S,
        query: impl Into<Vec<u8>>,
        response_capacity: usize,
    ) -> ClientResult<Self> {
        Self::from_link(Link::Connected(transport), query.into(), response_capacity)
    }

    fn from_link(link: Link<S>, query: Vec<u8>, response_capacity: usize) -> ClientResult<Self> {
        if response_capacity == 0 {
            return Err(ClientError::Configuration(
                "response capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            link,
            query,
            response_capacity,
        })
    }

    /// The query payload sent on every [`poll`](Self::poll).
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// The maximum number of bytes requested per response read.
    pub fn response_capacity(&self) -> usize {
        self.response_capacity
    }

    /// Whether the client currently holds a live transport.
    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    fn transport_mut(&mut self) -> ClientResult<&mut S> {
        match &mut self.link {
            Link::Connected(stream) => Ok(stream),
            Link::Unconnected | Link::Closed => Err(ClientError::NotConnected),
        }
    }

    /// Write a raw payload to the device.
    ///
    /// Loops until the entire payload has been handed to the transport, so a
    /// partially-accepting transport never silently truncates the query.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] if called before `connect` or
    /// after `close`, and [`ClientError::Io`] if the peer has reset or closed
    /// the connection.
    pub fn send(&mut self, data: &[u8]) -> ClientResult<()> {
        let stream = self.transport_mut()?;
        trace!(len = data.len(), "socket send");
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    /// Perform one bounded read and return whatever arrived.
    ///
    /// Issues exactly one blocking read for up to
    /// [`response_capacity`](Self::response_capacity) bytes. An empty result
    /// means the peer closed the connection (end of stream), which is distinct
    /// from a timeout: a configured timeout expiring surfaces as
    /// [`ClientError::Io`].
    ///
    /// This is deliberately not a read-until-N loop. A reply larger than the
    /// capacity, or one fragmented across read boundaries, yields only the
    /// first available chunk; the remainder stays in the transport.
    pub fn receive(&mut self) -> ClientResult<Vec<u8>> {
        let capacity = self.response_capacity;
        let stream = self.transport_mut()?;

        let mut buf = vec![0u8; capacity];
        let n = stream.read(&mut buf)?;
        buf.truncate(n);

        if n == 0 {
            debug!("peer closed the connection (end of stream)");
        }
        trace!(len = n, "socket recv");
        Ok(buf)
    }

    /// Execute one query/response exchange and return the reply bytes.
    ///
    /// Equivalent to [`send`](Self::send) with the configured query followed
    /// immediately by [`receive`](Self::receive); either side's error
    /// propagates unchanged. This is the steady-state polling primitive, e.g.
    /// for sampling a sensor in a loop.
    pub fn poll(&mut self) -> ClientResult<Vec<u8>> {
        let query = self.query.clone();
        self.send(&query)?;
        self.receive()
    }

    /// Release the transport and mark the client closed.
    ///
    /// Idempotent: closing an already-closed (or never-connected) client is a
    /// no-op. Any later protocol operation fails with
    /// [`ClientError::NotConnected`]; there is no reconnect-in-place.
    pub fn close(&mut self) {
        if matches!(self.link, Link::Connected(_)) {
            debug!("closing socket client");
        }
        self.link = Link::Closed;
    }
}

impl SocketClient<TcpStream> {
    /// Create an unconnected TCP client.
    ///
    /// `query` is the byte sequence transmitted verbatim on every
    /// [`poll`](Self::poll); `response_capacity` bounds every read. Call
    /// [`connect`](Self::connect) before any protocol operation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if `response_capacity` is zero.
    pub fn new(query: impl Into<Vec<u8>>, response_capacity: usize) -> ClientResult<Self> {
        Self::from_link(Link::Unconnected, query.into(), response_capacity)
    }

    /// Establish the TCP connection to the device.
    ///
    /// Blocks until the connection is established or the transport layer
    /// gives up; no timeout is imposed by default.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionFailed`] if the host is unreachable,
    /// refuses the connection, or the client is already connected, and
    /// [`ClientError::NotConnected`] on a closed client (a closed client
    /// cannot be revived).
    pub fn connect(&mut self, host: &str, port: u16) -> ClientResult<()> {
        match self.link {
            Link::Unconnected => {}
            Link::Connected(_) => {
                return Err(ClientError::ConnectionFailed(
                    "client is already connected".to_string(),
                ));
            }
            Link::Closed => return Err(ClientError::NotConnected),
        }

        let stream = TcpStream::connect((host, port))
            .map_err(|e| ClientError::ConnectionFailed(format!("{host}:{port}: {e}")))?;

        debug!(host, port, "connected to device");
        self.link = Link::Connected(stream);
        Ok(())
    }

    /// Set an optional read/write timeout on the underlying socket.
    ///
    /// `None` restores the default fully-blocking behavior. With a timeout
    /// configured, an expired [`receive`](Self::receive) fails with
    /// [`ClientError::Io`] rather than blocking forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> ClientResult<()> {
        let stream = self.transport_mut()?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        Ok(())
    }
}
