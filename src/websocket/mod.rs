//! Async WebSocket plumbing for the OKX v5 endpoints.
//!
//! This module is organized by concern:
//! - [`connection`] - Connection lifecycle, reconnection and teardown
//!
//! plus the connection primitives (`connect`, `ping`, `login`) shared by
//! the rest of the crate.

pub mod connection;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;
use crate::auth::login_request;
use crate::subscription::Transport;

/// Write half of an OKX WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of an OKX WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`BooksyncError`](crate::BooksyncError) if the connection or
/// TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(url, "WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Sends the feed's plain-text ping to keep the connection alive.
///
/// # Errors
///
/// Returns a [`BooksyncError`](crate::BooksyncError) if sending fails.
pub async fn ping(write: &mut WsWriter) -> Result<()> {
    write.send(Message::Text("ping".into())).await?;
    debug!("sent ping");

    Ok(())
}

/// Sends a signed `login` request on the private connection.
///
/// The acknowledgement arrives in-band as a `login` event frame.
///
/// # Errors
///
/// Returns a [`BooksyncError`](crate::BooksyncError) if signing or
/// sending fails.
pub async fn login(
    write: &mut WsWriter,
    api_key: &str,
    api_secret: &str,
    passphrase: &str,
) -> Result<()> {
    let request = login_request(api_key, api_secret, passphrase)?;
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    info!("sent login request");

    Ok(())
}

impl Transport for WsWriter {
    async fn send_json(&mut self, payload: String) -> Result<()> {
        self.send(Message::Text(payload.into())).await?;
        Ok(())
    }
}
