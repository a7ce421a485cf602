//! # Transport Abstraction
//!
//! A minimal, async interface for moving one request to the peer and one
//! response back.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The Transport knows nothing about envelopes or values.
//!   It moves opaque bodies plus a small set of string headers.
//! - **Request-Response**: One call, one reply. Nothing is ever re-sent; a
//!   failed exchange is reported and the caller decides what to do.

use std::collections::BTreeMap;
use std::fmt;

/// One side of an exchange: string headers and an opaque body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(body: Vec<u8>) -> Self {
        Self { headers: BTreeMap::new(), body }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// The operation timed out before a response was received.
    Timeout,
    /// The peer answered with a non-success status.
    Status(u16),
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Status(code) => write!(f, "Peer answered with status {}", code),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A mechanism to send a request and receive a reply.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and waits for the response.
    ///
    /// # Invariants
    /// - Must return `Ok(message)` with the raw reply on success.
    /// - Must return `Err` if the network fails or the peer reports a non-success status.
    /// - Should not interpret the body.
    async fn call(&self, request: Message) -> Result<Message>;
}
