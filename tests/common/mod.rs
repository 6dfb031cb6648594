//! Shared test utilities: an in-memory transport, frame builders, and
//! checksum helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use booksync::checksum::digest;
use booksync::error::{BooksyncError, Result};
use booksync::models::book::PriceLevel;
use booksync::subscription::Transport;

/// Records every envelope sent through it; optionally fails the N-th send
/// (zero-indexed) to exercise transport-failure paths.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    fail_on: Option<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    /// Envelopes sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn send_json(&mut self, payload: String) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(call) {
            return Err(BooksyncError::Transport("mock transport failure".into()));
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }
}

/// Builds a price level from decimal strings.
pub fn level(price: &str, size: &str) -> PriceLevel {
    PriceLevel {
        price: price.parse().unwrap(),
        size: size.parse().unwrap(),
    }
}

/// Renders levels as the wire's `[price, size, "0", "1"]` string arrays.
pub fn raw_levels(levels: &[PriceLevel]) -> serde_json::Value {
    serde_json::Value::Array(
        levels
            .iter()
            .map(|l| {
                serde_json::json!([
                    l.price.to_string(),
                    l.size.to_string(),
                    "0",
                    "1"
                ])
            })
            .collect(),
    )
}

/// The digest as the feed transmits it under the signed-int32 convention.
pub fn wire_checksum(bids: &[PriceLevel], asks: &[PriceLevel]) -> i64 {
    i64::from(digest(bids, asks) as i32)
}

/// A `books` channel frame carrying a correct checksum.
pub fn book_frame(
    inst_id: &str,
    action: &str,
    bids: &[PriceLevel],
    asks: &[PriceLevel],
    ts: &str,
) -> String {
    book_frame_with_checksum(inst_id, action, bids, asks, ts, wire_checksum(bids, asks))
}

/// A `books` channel frame with an explicit checksum value.
pub fn book_frame_with_checksum(
    inst_id: &str,
    action: &str,
    bids: &[PriceLevel],
    asks: &[PriceLevel],
    ts: &str,
    checksum: i64,
) -> String {
    serde_json::json!({
        "arg": { "channel": "books", "instId": inst_id },
        "action": action,
        "data": [{
            "bids": raw_levels(bids),
            "asks": raw_levels(asks),
            "ts": ts,
            "checksum": checksum,
            "seqId": 1
        }]
    })
    .to_string()
}

/// A subscription acknowledgement event frame.
pub fn subscribe_ack(channel: &str, inst_id: &str) -> String {
    serde_json::json!({
        "event": "subscribe",
        "arg": { "channel": channel, "instId": inst_id },
        "connId": "deadbeef"
    })
    .to_string()
}

/// A descending bid side of `n` levels starting just below `top`.
pub fn bid_ladder(n: usize) -> Vec<PriceLevel> {
    (0..n)
        .map(|i| level(&format!("{}", 50_000 - i as i64), "1.5"))
        .collect()
}

/// An ascending ask side of `n` levels starting just above the bids.
pub fn ask_ladder(n: usize) -> Vec<PriceLevel> {
    (0..n)
        .map(|i| level(&format!("{}", 50_001 + i as i64), "2.25"))
        .collect()
}
