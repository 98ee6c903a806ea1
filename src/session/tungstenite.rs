//! Websocket session implementation backed by `tokio-tungstenite`.
//!
//! All protocol messages travel as text frames carrying one JSON document
//! each. A pump task parses inbound frames and feeds them into the
//! [`MessageInbox`] channel; the channel closing signals that the
//! connection closed or failed.
//!
//! Control frames (ping/pong) are answered by the websocket library and
//! never reach the inbox. Binary frames are not part of this protocol and
//! are dropped with a warning.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::{
    // ---
    Connector,
    ConnectorPtr,
    Error,
    MessageInbox,
    Result,
    Session,
    SessionPtr,
    WsConfig,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket session over a split `tokio-tungstenite` stream.
///
/// The write half lives behind an async mutex so the session can be shared
/// (`&self` sends from concurrent callers); the read half is owned by the
/// pump task spawned at connect time.
struct WsSession {
    // ---
    sink: Mutex<SplitSink<WsStream, Message>>,
}

#[async_trait::async_trait]
impl Session for WsSession {
    // ---
    async fn send(&self, msg: Value) -> Result<()> {
        // ---
        let text = serde_json::to_string(&msg)?;

        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text))
            .await
            .map_err(|err| Error::Transport(err.to_string()))
    }

    async fn close(&self) -> Result<()> {
        // ---
        let mut sink = self.sink.lock().await;

        // A close on an already-closed stream is not an error worth
        // surfacing; the pump task observes the closure either way.
        if let Err(_err) = sink.close().await {
            tracing::debug!("close after stream already ended: {_err}");
        }
        Ok(())
    }
}

/// Read inbound frames until the stream ends, parsing text frames into the
/// inbox channel. Exits (closing the inbox) on stream end, close frame, or
/// transport error.
async fn pump_inbound(mut stream: SplitStream<WsStream>, tx: mpsc::Sender<Value>) {
    // ---
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                // ---
                let msg: Value = match serde_json::from_str(text.as_str()) {
                    Ok(msg) => msg,
                    Err(err) => {
                        tracing::warn!("dropping non-JSON text frame: {err}");
                        continue;
                    }
                };

                if tx.send(msg).await.is_err() {
                    // Inbox receiver dropped; nobody is listening anymore.
                    break;
                }
            }
            Ok(Message::Close(_frame)) => {
                tracing::debug!("peer closed the connection: {_frame:?}");
                break;
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("dropping unexpected binary frame");
            }
            Ok(_) => {
                // Ping/pong and raw frames are handled by the library.
            }
            Err(err) => {
                tracing::warn!("websocket stream error: {err}");
                break;
            }
        }
    }
}

/// Connector that opens real websocket connections.
struct WsConnector {
    // ---
    inbox_capacity: usize,
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    // ---
    async fn connect(&self, url: &str) -> Result<(SessionPtr, MessageInbox)> {
        // ---
        // Connector/network failures are terminal at this layer; no retry.
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|err| Error::Connect(err.to_string()))?;

        tracing::debug!(%url, "websocket connection established");

        let (sink, stream) = stream.split();
        let (tx, rx) = mpsc::channel(self.inbox_capacity);

        tokio::spawn(pump_inbound(stream, tx));

        let session = WsSession {
            sink: Mutex::new(sink),
        };

        Ok((std::sync::Arc::new(session), MessageInbox { inbox: rx }))
    }
}

/// Create a connector backed by `tokio-tungstenite`.
///
/// The returned connector opens one independent connection per `connect()`
/// call; the config only controls the inbound channel capacity.
pub fn create_ws_connector(config: &WsConfig) -> ConnectorPtr {
    // ---
    std::sync::Arc::new(WsConnector {
        inbox_capacity: config.inbox_capacity,
    })
}
