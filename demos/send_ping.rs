//! Ping demo
//!
//! Connects to a running Home Assistant instance, authenticates with a
//! long-lived access token, and sends a single `ping` command.
//!
//! Run with:
//!   HASS_URL=ws://homeassistant.local:8123 HASS_TOKEN=... \
//!     cargo run --example send_ping

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use hass_ws::{create_ws_connector, StaticToken, WsConfig, WsManager};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hass_ws=debug".into()),
        )
        .init();

    let api_url = std::env::var("HASS_URL").context("HASS_URL is not set")?;
    let token = std::env::var("HASS_TOKEN").context("HASS_TOKEN is not set")?;

    // ---
    // Build the manager; the connection is established on first use
    let config = WsConfig::new();
    let connector = create_ws_connector(&config);
    let manager = WsManager::new(connector, Arc::new(StaticToken::new(token)), api_url, config);

    // ---
    // Send a ping command
    let result = manager.send_command(json!({"type": "ping"})).await?;

    println!("pong: {result}");

    Ok(())
}
