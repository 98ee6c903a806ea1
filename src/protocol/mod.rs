/// Wire-format types for the websocket command protocol
///
/// This module defines the handshake and response message shapes and the
/// literal type markers the peer uses.
mod message;

pub use message::{
    //
    auth_message,
    AuthResult,
    CommandResponse,
    HelloMessage,
    AUTH_OK,
    AUTH_REQUIRED,
    TYPE_AUTH,
};
