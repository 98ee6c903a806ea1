//! Public, transport-agnostic client configuration.
//!
//! This type intentionally contains no websocket-specific concepts
//! (e.g. TLS options, header tweaks). Session layers are responsible for
//! interpreting connection settings into concrete transport behavior.

use std::time::Duration;

/// Timeouts and channel sizing for a websocket client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    // ---
    /// Maximum time to wait for each handshake message (hello, auth result).
    ///
    /// A peer that accepts the connection but never speaks fails the
    /// handshake with a timeout instead of stalling the caller forever.
    ///
    /// Default: 10 seconds
    pub handshake_timeout: Duration,

    /// Timeout for waiting on a command's response.
    ///
    /// `None` disables the bound and waits indefinitely, matching the
    /// behavior of peers that are trusted to always answer.
    ///
    /// Default: 30 seconds
    pub command_timeout: Option<Duration>,

    /// Capacity of the inbound message channel between the session pump
    /// and the client's receive loop.
    ///
    /// Default: 16
    pub inbox_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            command_timeout: Some(Duration::from_secs(30)),
            inbox_capacity: 16,
        }
    }
}

impl WsConfig {
    /// Create a config with the default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-message handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the command response timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use hass_ws::WsConfig;
    /// use std::time::Duration;
    ///
    /// let config = WsConfig::new().with_command_timeout(Duration::from_secs(5));
    /// ```
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Disable the command response timeout entirely.
    ///
    /// A non-responding peer then stalls the caller until the connection
    /// closes.
    pub fn without_command_timeout(mut self) -> Self {
        self.command_timeout = None;
        self
    }

    /// Set the inbound channel capacity.
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }
}
