//! Live API integration tests for the OKX v5 public WebSocket.
//!
//! These tests connect to the real OKX endpoint and require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::time::{Duration, timeout};

use booksync::models::Channel;
use booksync::subscription::{Multiplexer, SubscriptionEntry, SubscriptionRegistry};
use booksync::websocket::{connect, ping};

const OKX_PUBLIC_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

#[tokio::test]
async fn connects_to_public_endpoint() {
    let result = connect(OKX_PUBLIC_WS_URL).await;
    assert!(result.is_ok(), "Failed to connect to OKX WebSocket");
}

#[tokio::test]
async fn ping_receives_pong() {
    let (mut write, mut read) = connect(OKX_PUBLIC_WS_URL)
        .await
        .expect("Failed to connect");

    ping(&mut write).await.expect("Failed to send ping");

    let received = timeout(Duration::from_secs(5), async {
        while let Some(msg) = read.next().await {
            if let Ok(tungstenite::Message::Text(text)) = msg {
                if text == "pong" {
                    return true;
                }
            }
        }
        false
    });

    assert!(
        received.await.expect("Timeout waiting for pong"),
        "Did not receive pong response"
    );
}

#[tokio::test]
async fn subscribe_receives_book_snapshot() {
    let (write, mut read) = connect(OKX_PUBLIC_WS_URL)
        .await
        .expect("Failed to connect");

    let registry = Arc::new(SubscriptionRegistry::new());
    let mut mux = Multiplexer::new(write, registry.clone());
    let entry = SubscriptionEntry::instrument(Channel::Books, "BTC-USDT");
    mux.subscribe(std::slice::from_ref(&entry))
        .await
        .expect("Failed to subscribe to books");

    let received = timeout(Duration::from_secs(10), async {
        while let Some(msg) = read.next().await {
            if let Ok(tungstenite::Message::Text(text)) = msg {
                if text.contains("\"action\":\"snapshot\"") {
                    return true;
                }
            }
        }
        false
    });

    assert!(
        received.await.expect("Timeout waiting for snapshot"),
        "Did not receive book snapshot"
    );

    mux.unsubscribe(std::slice::from_ref(&entry))
        .await
        .expect("Failed to unsubscribe from books");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn subscribe_receives_ticker() {
    let (write, mut read) = connect(OKX_PUBLIC_WS_URL)
        .await
        .expect("Failed to connect");

    let registry = Arc::new(SubscriptionRegistry::new());
    let mut mux = Multiplexer::new(write, registry);
    let entry = SubscriptionEntry::instrument(Channel::Tickers, "BTC-USDT");
    mux.subscribe(std::slice::from_ref(&entry))
        .await
        .expect("Failed to subscribe to tickers");

    let received = timeout(Duration::from_secs(10), async {
        while let Some(msg) = read.next().await {
            if let Ok(tungstenite::Message::Text(text)) = msg {
                if text.contains("\"channel\":\"tickers\"") && text.contains("\"data\"") {
                    return true;
                }
            }
        }
        false
    });

    assert!(
        received.await.expect("Timeout waiting for ticker"),
        "Did not receive ticker message"
    );
}
