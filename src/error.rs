use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while connecting to or talking with the peer.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level connection could not be established
    #[error("can't connect: {0}")]
    Connect(String),

    /// The peer rejected the authentication handshake
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The handshake produced a message we did not expect
    #[error("unexpected handshake message: {0}")]
    Handshake(String),

    /// The peer answered a command with `success: false`; carries the
    /// full response body for diagnostics
    #[error("command rejected by peer: {0}")]
    Command(Value),

    /// No response arrived within the configured command timeout
    #[error("timed out waiting for response")]
    Timeout,

    /// The connection closed while a command was in flight
    #[error("connection closed")]
    Closed,

    /// Sending or receiving on the underlying session failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Command payloads must serialize to a JSON object
    #[error("command payload must be a JSON object")]
    InvalidCommand,

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The token provider could not supply an access token
    #[error("no access token available")]
    MissingToken,
}

impl Error {
    /// Whether this error means the connection itself is unusable.
    ///
    /// The manager clears its cached client for these kinds so the next
    /// call performs a fresh handshake. A command rejection
    /// (`success: false`) leaves the connection healthy.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connect(_) | Error::Timeout | Error::Closed | Error::Transport(_)
        )
    }
}

/// Unified error kind observed by callers of the connection manager.
///
/// [`WsManager::send_command`](crate::WsManager::send_command) wraps every
/// internal failure in this type, so external callers depend on exactly one
/// error kind regardless of which stage failed. The underlying [`Error`] is
/// available as the source for diagnostics.
#[derive(Error, Debug)]
#[error("websocket API error: {0}")]
pub struct WsApiError(#[from] pub Error);

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;
