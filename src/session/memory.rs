//! In-memory session implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! [`Session`](crate::Session) and [`Connector`](crate::Connector) traits.
//! It is intended primarily for testing, local execution, and as a
//! reference for session semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory session defines the **reference behavior** for the session
//! layer. Other implementations are expected to approximate this behavior
//! as closely as their underlying systems allow:
//!
//! - Messages sent by one side arrive at the other side in send order.
//! - The inbox channel closes exactly when the peer endpoint is dropped.
//! - No messages are dropped due to timing, scheduling, or background IO.
//!
//! ## Non-Goals
//!
//! This session does not attempt to emulate websocket framing, TLS, or the
//! failure modes of a real network. It exists to provide a deterministic
//! baseline against which the handshake and correlation logic can be
//! validated.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    // ---
    Connector,
    ConnectorPtr,
    Error,
    MessageInbox,
    Result,
    Session,
    SessionPtr,
};

/// The far end of an in-memory connection, handed to the test harness.
///
/// A scripted peer reads the client's messages from `inbox` and delivers
/// replies through `outbox`. Dropping the endpoint closes the client's
/// inbox, which the client observes as the connection closing.
#[derive(Debug)]
pub struct PeerEndpoint {
    // ---
    /// Messages the client sent, in send order.
    pub inbox: mpsc::Receiver<Value>,

    /// Channel for delivering messages to the client.
    pub outbox: mpsc::Sender<Value>,

    /// The URL the client connected to, for assertions.
    pub url: String,
}

/// Client-side half of an in-memory connection.
struct MemorySession {
    // ---
    tx: mpsc::Sender<Value>,
}

#[async_trait::async_trait]
impl Session for MemorySession {
    // ---
    async fn send(&self, msg: Value) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| Error::Transport("peer endpoint dropped".into()))
    }

    async fn close(&self) -> Result<()> {
        // The channel closes when the session is dropped; nothing to do.
        Ok(())
    }
}

/// Connector that emits a [`PeerEndpoint`] for every accepted connection.
struct MemoryConnector {
    // ---
    capacity: usize,
    peers: mpsc::Sender<PeerEndpoint>,
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    // ---
    async fn connect(&self, url: &str) -> Result<(SessionPtr, MessageInbox)> {
        // ---
        let (to_peer_tx, to_peer_rx) = mpsc::channel(self.capacity);
        let (to_client_tx, to_client_rx) = mpsc::channel(self.capacity);

        let endpoint = PeerEndpoint {
            inbox: to_peer_rx,
            outbox: to_client_tx,
            url: url.to_string(),
        };

        // No harness listening for connections means there is no peer to
        // reach, which is exactly a connect failure.
        self.peers
            .send(endpoint)
            .await
            .map_err(|_| Error::Connect(format!("no peer listening on {url}")))?;

        let session = MemorySession { tx: to_peer_tx };

        Ok((Arc::new(session), MessageInbox { inbox: to_client_rx }))
    }
}

/// Create an in-memory connector plus the stream of peer endpoints it
/// produces.
///
/// Each `connect()` call on the returned connector yields one
/// [`PeerEndpoint`] on the receiver; the test harness drives the peer side
/// of the conversation through it.
///
/// # Example
///
/// ```
/// # use serde_json::json;
/// # async fn example() {
/// let (connector, mut peers) = hass_ws::create_memory_connector(16);
///
/// tokio::spawn(async move {
///     while let Some(mut peer) = peers.recv().await {
///         peer.outbox
///             .send(json!({"type": "auth_required", "ha_version": "2024.1.0"}))
///             .await
///             .ok();
///         // ... read the auth message, answer commands ...
///         let _ = peer.inbox.recv().await;
///     }
/// });
/// # }
/// ```
pub fn create_memory_connector(capacity: usize) -> (ConnectorPtr, mpsc::Receiver<PeerEndpoint>) {
    // ---
    let (peers_tx, peers_rx) = mpsc::channel(capacity);

    let connector = MemoryConnector {
        capacity,
        peers: peers_tx,
    };

    (Arc::new(connector), peers_rx)
}
