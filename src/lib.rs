//! Synchronous query/response client for instruments behind a raw TCP socket.
//!
//! Some hardware exposes neither GPIB nor SCPI, just a bare socket that
//! answers a fixed query with a chunk of bytes. This crate wraps that
//! exchange: connect, send the configured query, read one bounded response,
//! repeat. No framing, no payload interpretation, no retries; polling loops
//! own their own error policy.
//!
//! See [`SocketClient`] for the full protocol contract.

pub mod client;

pub use client::{
    ClientError, ClientResult, SocketClient, DEFAULT_QUERY, DEFAULT_RESPONSE_CAPACITY,
};
