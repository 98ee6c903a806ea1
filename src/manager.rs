//! Connection manager.
//!
//! [`WsManager`] owns the lazily created [`WsClient`] and is the single
//! error-translation boundary: callers of its `send_command` observe
//! exactly one error kind, [`WsApiError`], regardless of which internal
//! stage failed.
//!
//! The cached-client slot lives behind an async mutex so concurrent
//! first-use callers cannot race two handshakes. The lock covers only
//! slot access; commands themselves run outside it and may overlap.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    // ---
    ConnectorPtr,
    Error,
    Result,
    TokenProviderPtr,
    WsApiError,
    WsClient,
    WsConfig,
};

/// Fixed path segment appended to the base API URL.
pub const WEBSOCKET_PATH: &str = "/api/websocket";

/// Lazily connected websocket command gateway.
///
/// Created once per process; the first `send_command` call ensures a valid
/// access token, performs the handshake against
/// `{api_url}/api/websocket`, and caches the resulting client. Subsequent
/// calls reuse it until a connection-fatal failure clears the slot, after
/// which the next call performs a fresh handshake.
pub struct WsManager {
    // ---
    connector: ConnectorPtr,
    tokens: TokenProviderPtr,
    api_url: String,
    config: WsConfig,

    /// At most one live client; a replacement client takes the slot, it is
    /// never mutated in place.
    client: Mutex<Option<WsClient>>,
}

impl WsManager {
    // ---
    /// Create a manager. No connection is attempted until the first
    /// command is sent.
    ///
    /// `api_url` is the base API URL without the websocket path, e.g.
    /// `ws://homeassistant.local:8123`.
    pub fn new(
        connector: ConnectorPtr,
        tokens: TokenProviderPtr,
        api_url: impl Into<String>,
        config: WsConfig,
    ) -> Self {
        // ---
        Self {
            connector,
            tokens,
            api_url: api_url.into(),
            config,
            client: Mutex::new(None),
        }
    }

    /// Send a command through the cached client, connecting first if
    /// needed.
    ///
    /// # Errors
    ///
    /// Every failure — token, connect, handshake, or command — surfaces as
    /// [`WsApiError`] wrapping the stage-specific [`Error`]. Connection-
    /// fatal failures additionally clear the cached client so the next
    /// call reconnects.
    pub async fn send_command<T: Serialize>(&self, msg: T) -> std::result::Result<Value, WsApiError> {
        // ---
        let client = self.get_or_connect().await?;

        match client.send_command(msg).await {
            Ok(result) => Ok(result),
            Err(err) => {
                if err.is_connection_fatal() {
                    self.invalidate(&client).await;
                }
                Err(WsApiError(err))
            }
        }
    }

    /// Whether a client is currently cached.
    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Drop the cached client, if any.
    ///
    /// The next `send_command` call performs a fresh handshake.
    pub async fn disconnect(&self) {
        // ---
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.take() {
            if let Err(_err) = client.close().await {
                tracing::debug!("error closing websocket client: {_err}");
            }
        }
    }

    /// Return the cached client or establish a new one.
    ///
    /// Holding the slot lock across the whole handshake makes client
    /// creation single-flight: a second caller arriving during the
    /// handshake waits and then reuses the fresh client. A failed
    /// handshake never reaches the slot.
    async fn get_or_connect(&self) -> Result<WsClient> {
        // ---
        let mut slot = self.client.lock().await;

        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        self.tokens.ensure_access_token().await?;
        let token = self
            .tokens
            .access_token()
            .await
            .ok_or(Error::MissingToken)?;

        let url = format!("{}{WEBSOCKET_PATH}", self.api_url);
        tracing::debug!("establishing websocket client against {url}");

        let client =
            WsClient::connect_with_auth(self.connector.as_ref(), &url, &token, &self.config)
                .await?;

        *slot = Some(client.clone());
        Ok(client)
    }

    /// Clear the slot if it still holds the client that just failed.
    ///
    /// The pointer check keeps a slow failure report from discarding a
    /// newer client that already replaced the failed one.
    async fn invalidate(&self, failed: &WsClient) {
        // ---
        let mut slot = self.client.lock().await;

        if slot.as_ref().is_some_and(|cached| WsClient::ptr_eq(cached, failed)) {
            tracing::debug!("discarding failed websocket client");
            *slot = None;
        }
    }
}
