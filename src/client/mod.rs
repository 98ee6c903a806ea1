//! Websocket protocol client.
//!
//! This module contains the core [`WsClient`] type which performs the
//! hello/auth handshake on connect and then exchanges correlated command
//! and response messages over the open session.
//!
//! # Architecture
//!
//! The handshake consumes the session's inbox sequentially: one hello
//! message, then — after the token is sent — one auth-result message. Once
//! the peer accepts the token, the inbox moves into a background receive
//! loop that matches incoming responses with in-flight commands by their
//! `id` field.
//!
//! Each command is assigned the next value of a strictly increasing
//! counter and registers a oneshot channel in the pending map under that
//! id. When a response arrives, the receive loop looks up the channel and
//! delivers the full response body to the waiting command.
//!
//! # Concurrency
//!
//! Multiple commands can be in flight simultaneously; correlation by id
//! keeps their responses apart even when the peer answers out of order.
//! The pending map is protected by a mutex but lock contention is minimal
//! since operations are just HashMap insert/remove.

mod pending;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time;

use crate::protocol::{auth_message, AuthResult, CommandResponse, HelloMessage, AUTH_OK, AUTH_REQUIRED};
use crate::{
    // ---
    Connector,
    Error,
    MessageInbox,
    Result,
    SessionPtr,
    WsConfig,
};

use pending::PendingCommands;

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// Mutex poisoning indicates that another task panicked while holding the
/// lock. The protected state here is a best-effort pending-command map
/// (id → oneshot sender).
///
/// Ignoring poisoning is acceptable because:
/// - There are no invariants spanning multiple fields.
/// - The worst outcome is a dropped or unmatched response.
/// - Connection-level failures are handled by the receive loop.
///
/// This avoids propagating non-`Send` poison errors across async boundaries.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Authenticated websocket client.
///
/// Cheap to clone (internally `Arc`-backed). One instance owns one logical
/// connection; it is discarded, not repaired, when the connection fails.
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClient")
            .field("ha_version", &self.inner.ha_version)
            .finish_non_exhaustive()
    }
}

struct Inner {
    // ---
    session: SessionPtr,
    ha_version: String,

    /// Correlation counter. Incremented before each send; the peer requires
    /// ids to be positive and strictly increasing per connection.
    next_id: AtomicU64,

    pending: Mutex<PendingCommands>,

    /// Set by the receive loop when the session's inbox closes. Commands
    /// sent afterwards fail immediately instead of waiting on a timeout.
    closed: AtomicBool,

    command_timeout: Option<Duration>,

    /// Best-effort receive loop handle.
    ///
    /// We keep it so the task isn't immediately dropped, and so it can be
    /// extended later (shutdown, join-on-close, etc.).
    _rx_task: JoinHandle<()>,
}

/// Receive one handshake message within the given time limit.
async fn recv_handshake(inbox: &mut MessageInbox, limit: Duration) -> Result<Value> {
    // ---
    time::timeout(limit, inbox.inbox.recv())
        .await
        .map_err(|_| Error::Timeout)?
        .ok_or(Error::Closed)
}

impl WsClient {
    // ---
    /// Connect to `url` and perform the authentication handshake.
    ///
    /// The handshake is: receive the peer's hello (capturing its version
    /// string), send the bearer token, receive the auth result. Any failure
    /// is terminal — the session is dropped and no client is produced.
    ///
    /// # Errors
    ///
    /// - `Error::Connect` - the transport could not be established
    /// - `Error::Handshake` - the hello message was malformed or carried an
    ///   unexpected type marker
    /// - `Error::Auth` - the auth result was not `auth_ok`
    /// - `Error::Timeout` / `Error::Closed` - the peer went silent or hung
    ///   up mid-handshake
    pub async fn connect_with_auth(
        connector: &dyn Connector,
        url: &str,
        token: &str,
        config: &WsConfig,
    ) -> Result<Self> {
        // ---
        let (session, mut inbox) = connector.connect(url).await?;

        let hello = recv_handshake(&mut inbox, config.handshake_timeout).await?;
        tracing::debug!("received handshake message: {hello}");

        let hello: HelloMessage = serde_json::from_value(hello)
            .map_err(|err| Error::Handshake(format!("malformed hello message: {err}")))?;

        // Older peers omit the type marker on the hello; when present it
        // must announce the auth phase.
        if let Some(msg_type) = hello.msg_type.as_deref() {
            if msg_type != AUTH_REQUIRED {
                return Err(Error::Handshake(format!(
                    "expected {AUTH_REQUIRED}, peer sent {msg_type}"
                )));
            }
        }

        tracing::debug!("sending access token");
        session.send(auth_message(token)).await?;

        let auth = recv_handshake(&mut inbox, config.handshake_timeout).await?;
        tracing::debug!("received auth result: {auth}");

        let auth: AuthResult = serde_json::from_value(auth)
            .map_err(|err| Error::Handshake(format!("malformed auth result: {err}")))?;

        if auth.msg_type != AUTH_OK {
            return Err(Error::Auth(auth.message.unwrap_or(auth.msg_type)));
        }

        Ok(Self::ready(session, inbox, hello.ha_version, config))
    }

    /// Build the ready client and spawn its receive loop.
    ///
    /// The loop holds only a `Weak` reference to the client internals so
    /// dropping the last `WsClient` clone ends it.
    fn ready(
        session: SessionPtr,
        mut inbox: MessageInbox,
        ha_version: String,
        config: &WsConfig,
    ) -> Self {
        // ---
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            // ---
            let weak = weak.clone();

            let rx_task = tokio::spawn(async move {
                // ---
                loop {
                    match inbox.inbox.recv().await {
                        Some(msg) => {
                            let Some(inner) = weak.upgrade() else {
                                // Inner was dropped, exit loop
                                break;
                            };
                            WsClient { inner }.handle_message(msg);
                        }
                        None => {
                            // Session closed or failed underneath us. Fail
                            // every in-flight command and poison the client
                            // so later sends fail fast.
                            tracing::debug!("session inbox closed, ending receive loop");

                            if let Some(inner) = weak.upgrade() {
                                inner.closed.store(true, Ordering::SeqCst);
                                lock_ignore_poison(&inner.pending).clear();
                            }
                            break;
                        }
                    }
                }
            });

            Inner {
                // ---
                session,
                ha_version,
                next_id: AtomicU64::new(0),
                pending: Mutex::new(PendingCommands::new()),
                closed: AtomicBool::new(false),
                command_timeout: config.command_timeout,
                _rx_task: rx_task,
            }
        });

        Self { inner }
    }

    /// Peer version string captured from the hello message.
    pub fn ha_version(&self) -> &str {
        &self.inner.ha_version
    }

    /// Whether the underlying connection has closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Send a command and wait for its response.
    ///
    /// The command must serialize to a JSON object; the protocol layer
    /// injects the `id` field (overwriting any caller-provided value) and
    /// controls nothing else in the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `Error::InvalidCommand` - the payload is not a JSON object
    /// - `Error::Serialization` - serialization fails or the response body
    ///   is malformed
    /// - `Error::Command` - the peer answered with `success: false`; the
    ///   error carries the full response body
    /// - `Error::Timeout` - no response within the configured timeout
    /// - `Error::Closed` / `Error::Transport` - the connection went away
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use serde_json::json;
    /// # async fn example(client: hass_ws::WsClient) -> hass_ws::Result<()> {
    /// let config = client
    ///     .send_command(json!({"type": "get_config"}))
    ///     .await?;
    /// println!("unit system: {}", config["unit_system"]["length"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_command<T: Serialize>(&self, msg: T) -> Result<Value> {
        // ---
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let mut msg = serde_json::to_value(msg)?;
        let body = msg.as_object_mut().ok_or(Error::InvalidCommand)?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        body.insert("id".to_string(), Value::from(id));

        let rx = lock_ignore_poison(&self.inner.pending).register(id);

        tracing::debug!("sending command {msg}");

        if let Err(err) = self.inner.session.send(msg).await {
            lock_ignore_poison(&self.inner.pending).remove(id);
            return Err(err);
        }

        let response = match self.inner.command_timeout {
            Some(limit) => match time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    lock_ignore_poison(&self.inner.pending).remove(id);
                    return Err(Error::Timeout);
                }
            },
            None => rx.await,
        };

        // A closed oneshot means the receive loop cleared the pending map
        // on connection loss.
        let response = response.map_err(|_| Error::Closed)?;

        tracing::debug!("received response {response}");

        let mut parsed: CommandResponse = serde_json::from_value(response.clone())?;

        if parsed.success {
            Ok(parsed.result.take().unwrap_or(Value::Null))
        } else {
            Err(Error::Command(response))
        }
    }

    /// Close the underlying session.
    ///
    /// In-flight commands fail with `Error::Closed` once the receive loop
    /// observes the closure.
    pub async fn close(&self) -> Result<()> {
        self.inner.session.close().await
    }

    /// Dispatch one inbound message from the receive loop.
    fn handle_message(&self, msg: Value) {
        // ---
        let Some(id) = msg.get("id").and_then(Value::as_u64) else {
            tracing::debug!("dropping message without correlation id: {msg}");
            return;
        };

        let delivered = lock_ignore_poison(&self.inner.pending).complete(id, msg);

        if !delivered {
            // Either the command timed out and was cleaned up, or the peer
            // sent an id we never issued.
            tracing::warn!("dropping response with no pending command (id: {id})");
        }
    }

    pub(crate) fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}
