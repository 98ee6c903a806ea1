//! Domain layer public interface.
//!
//! This module defines the collaborator seams the protocol layer depends
//! on, independent of any concrete websocket library or HTTP auth flow.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod session;
mod token;

// --- Session domain re-exports ---

pub use session::{
    //
    Connector,
    ConnectorPtr,
    MessageInbox,
    Session,
    SessionPtr,
};

// --- Token domain re-exports ---

pub use token::{StaticToken, TokenProvider, TokenProviderPtr};
