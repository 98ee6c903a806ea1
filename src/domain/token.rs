// src/domain/token.rs

//! Access-token domain abstraction.
//!
//! Obtaining and refreshing bearer tokens is an HTTP concern that lives
//! outside this crate. The manager only needs two capabilities: make sure
//! a non-expired token exists, and read its current value.

use crate::Result;
use std::sync::Arc;

/// Supplies the bearer token used during the auth handshake.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    // ---
    /// Ensure a fresh, non-expired access token is available.
    ///
    /// Implementations typically refresh against their auth endpoint when
    /// the cached token is close to expiry.
    async fn ensure_access_token(&self) -> Result<()>;

    /// Current access token value, if one is available.
    async fn access_token(&self) -> Option<String>;
}

/// Shared token provider pointer.
pub type TokenProviderPtr = Arc<dyn TokenProvider>;

/// Fixed-token provider for demos and tests.
///
/// Real deployments implement [`TokenProvider`] against their HTTP auth
/// layer; this one hands out the same long-lived token forever.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a long-lived access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    // ---
    async fn ensure_access_token(&self) -> Result<()> {
        Ok(())
    }

    async fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
