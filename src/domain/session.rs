// src/domain/session.rs

//! Session domain abstractions.
//!
//! This module defines the transport seam between the protocol client and
//! the machinery that actually moves websocket frames. It intentionally
//! avoids any reference to concrete websocket libraries, TLS, or HTTP
//! upgrade details.
//!
//! A session delivers whole JSON messages in both directions. Higher-level
//! semantics such as the auth handshake, correlation ids, or timeouts are
//! handled by the client layer.
//!
//! Concrete implementations of this interface live under `src/session/`.

use crate::Result;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

/// Inbound half of an open session.
///
/// The session implementation parses incoming frames into JSON values and
/// feeds them into this channel. The channel closing means the underlying
/// connection closed or failed; no further messages will arrive.
///
/// The inbox is consumed sequentially during the handshake, then moved
/// into the client's receive loop.
#[derive(Debug)]
pub struct MessageInbox {
    // ---
    /// Receiver channel for parsed inbound messages.
    pub inbox: mpsc::Receiver<Value>,
}

/// Outbound half of an open session.
///
/// Implementations must ensure that:
/// - `send()` transmits one complete message per call, preserving call
///   order for a single caller.
/// - Messages accepted by `send()` before a failure are not silently
///   reordered with messages accepted after it.
/// - `close()` is idempotent.
///
/// The in-memory session serves as the reference implementation of these
/// semantics.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    // ---
    /// Transmit one JSON message to the peer.
    async fn send(&self, msg: Value) -> Result<()>;

    /// Close the session and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared session pointer.
///
/// An `Arc<dyn Session>`, so `.clone()` is cheap and multiple clones share
/// the same underlying connection.
pub type SessionPtr = Arc<dyn Session>;

/// Establishes sessions against a websocket endpoint.
///
/// The connector owns everything below the message layer: DNS, TCP, TLS,
/// and the websocket upgrade. A host that cannot be reached must surface
/// as [`Error::Connect`](crate::Error::Connect) so the handshake can fail
/// with a distinct "can't connect" kind.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    // ---
    /// Open a duplex message session to `url`.
    async fn connect(&self, url: &str) -> Result<(SessionPtr, MessageInbox)>;
}

/// Shared connector pointer, used to erase the concrete websocket stack
/// behind a stable domain interface.
pub type ConnectorPtr = Arc<dyn Connector>;
