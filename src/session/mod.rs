//! Session implementations.
//!
//! This module provides concrete implementations of the domain-level
//! [`Connector`](crate::Connector) and [`Session`](crate::Session) traits,
//! exposed only through constructor functions.
//!
//! Domain code must not depend on session-specific types.

mod memory;
mod tungstenite;

pub use memory::{create_memory_connector, PeerEndpoint};
pub use tungstenite::create_ws_connector;
