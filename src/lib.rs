//! Authenticated websocket client with correlated command/response exchange
//!
//! This library connects to a Home Assistant style websocket API, performs
//! the hello/auth handshake, and then exchanges commands and responses over
//! the single persistent connection. It handles correlation id assignment,
//! response matching, timeout handling, and concurrent in-flight commands.
//!
//! Two layers compose top-down:
//!
//! - [`WsManager`] lazily establishes and caches one authenticated client
//!   per process and translates every internal failure into the unified
//!   [`WsApiError`] kind.
//! - [`WsClient`] owns the live connection: it captures the peer version
//!   during the handshake, injects strictly increasing `id` fields into
//!   outgoing commands, and matches responses back to their commands.
//!
//! Token acquisition and the websocket transport sit behind the
//! [`TokenProvider`] and [`Connector`] traits; a real `tokio-tungstenite`
//! connector and an in-memory test connector are provided.

// Import all sub modules once...
mod client;
mod manager;
mod session;

mod config;

mod domain;
mod error;
mod protocol;

// Re-export main types
pub use client::WsClient;
pub use manager::{WsManager, WEBSOCKET_PATH};

pub use config::WsConfig;

pub use error::{Error, Result, WsApiError};

pub use session::{create_memory_connector, create_ws_connector, PeerEndpoint};

// --- public re-exports
pub use domain::{
    //
    Connector,
    ConnectorPtr,
    MessageInbox,
    Session,
    SessionPtr,
    StaticToken,
    TokenProvider,
    TokenProviderPtr,
};

pub use protocol::{
    //
    auth_message,
    AuthResult,
    CommandResponse,
    HelloMessage,
    AUTH_OK,
    AUTH_REQUIRED,
    TYPE_AUTH,
};
