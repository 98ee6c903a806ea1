use serde::Deserialize;
use serde_json::{json, Value};

/// Type marker on the outbound authentication message.
pub const TYPE_AUTH: &str = "auth";

/// Type marker the peer sends on its first message after connect.
pub const AUTH_REQUIRED: &str = "auth_required";

/// Success marker on the inbound auth-result message.
pub const AUTH_OK: &str = "auth_ok";

/// Build the outbound authentication message carrying the bearer token.
pub fn auth_message(token: &str) -> Value {
    json!({ "type": TYPE_AUTH, "access_token": token })
}

/// First message after connect, carrying the peer's version string.
#[derive(Debug, Deserialize)]
pub struct HelloMessage {
    /// Type discriminant; older peers may omit it.
    #[serde(rename = "type")]
    pub msg_type: Option<String>,

    /// Peer version, captured verbatim as the client's negotiated version.
    pub ha_version: String,
}

/// Second inbound handshake message carrying the authentication result.
#[derive(Debug, Deserialize)]
pub struct AuthResult {
    /// Must equal [`AUTH_OK`] for the handshake to succeed.
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Human-readable rejection reason, when the peer provides one.
    pub message: Option<String>,
}

/// Response to a previously sent command.
#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    /// Correlation id echoed back from the command, when present.
    pub id: Option<u64>,

    /// Whether the peer accepted the command.
    pub success: bool,

    /// Result payload; present on success, may be null.
    #[serde(default)]
    pub result: Option<Value>,
}
