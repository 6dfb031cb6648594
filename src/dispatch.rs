//! Inbound frame classification and the reader loop.
//!
//! Every decoded frame is classified into the closed [`FeedFrame`] set
//! before any further processing; unknown channels land in
//! [`FeedFrame::Unhandled`] rather than falling through silently. Book
//! frames are applied to the [`BookStore`]; everything else is handed to
//! the caller's [`FeedHandler`] unchanged.

use futures_util::StreamExt;
use tracing::{debug, warn};
use tungstenite::Message;

use crate::book::{BookKey, BookState, BookStatus, BookStore};
use crate::error::{BooksyncError, Result};
use crate::models::account::AccountFrame;
use crate::models::book::{BookFrame, parse_levels};
use crate::models::candle::CandleFrame;
use crate::models::order::OrderFrame;
use crate::models::ticker::TickerFrame;
use crate::models::trade::TradeFrame;
use crate::models::{Channel, EventResponse};
use crate::resync::ResyncController;
use crate::subscription::{Multiplexer, SubscriptionEntry, Transport};
use crate::websocket::WsReader;

/// A decoded inbound frame, classified by logical channel.
#[derive(Debug)]
pub enum FeedFrame {
    /// Full book replacement (explicit `snapshot`/`partial` action, or an
    /// untagged full-state channel at depth).
    BookSnapshot(BookFrame),
    /// Incremental book diff.
    BookUpdate(BookFrame),
    Ticker(TickerFrame),
    Trade(TradeFrame),
    Candle(CandleFrame),
    Order(OrderFrame),
    Account(AccountFrame),
    /// Subscribe/unsubscribe/login acknowledgement or protocol error.
    Event(EventResponse),
    /// Recognized JSON on a channel this crate does not model.
    Unhandled(serde_json::Value),
}

/// Classifies one decoded JSON message.
///
/// # Errors
///
/// Returns [`BooksyncError::MalformedFrame`] if the frame names a known
/// channel but its payload does not decode, or a book frame carries an
/// unknown action tag.
pub fn classify(value: serde_json::Value) -> Result<FeedFrame> {
    if value.get("event").is_some() {
        return Ok(FeedFrame::Event(serde_json::from_value(value)?));
    }

    let channel = value
        .get("arg")
        .and_then(|arg| arg.get("channel"))
        .and_then(|c| c.as_str())
        .and_then(Channel::from_wire);

    let Some(channel) = channel else {
        return Ok(FeedFrame::Unhandled(value));
    };

    if channel.is_book() {
        let frame: BookFrame = serde_json::from_value(value)?;
        return match frame.action.as_deref() {
            Some("snapshot") | Some("partial") => Ok(FeedFrame::BookSnapshot(frame)),
            Some("update") => Ok(FeedFrame::BookUpdate(frame)),
            Some(other) => Err(BooksyncError::MalformedFrame(format!(
                "unknown book action {other:?}"
            ))),
            // Untagged channels are full-state: a frame at the channel's
            // depth is a snapshot.
            None => {
                let depth = channel.snapshot_depth().unwrap_or(1);
                let levels = frame
                    .data
                    .first()
                    .map(|d| d.bids.len().max(d.asks.len()))
                    .unwrap_or(0);
                if levels >= depth {
                    Ok(FeedFrame::BookSnapshot(frame))
                } else {
                    Ok(FeedFrame::BookUpdate(frame))
                }
            }
        };
    }

    match channel {
        Channel::Tickers => Ok(FeedFrame::Ticker(serde_json::from_value(value)?)),
        Channel::Trades => Ok(FeedFrame::Trade(serde_json::from_value(value)?)),
        Channel::Candles => Ok(FeedFrame::Candle(serde_json::from_value(value)?)),
        Channel::Orders => Ok(FeedFrame::Order(serde_json::from_value(value)?)),
        Channel::Account => Ok(FeedFrame::Account(serde_json::from_value(value)?)),
        _ => Ok(FeedFrame::Unhandled(value)),
    }
}

/// Receives everything the dispatcher does not own: non-book frames, and
/// the verified book after every accepted snapshot or update.
pub trait FeedHandler {
    /// Called with the verified, updated book. Never called with
    /// unverified state.
    fn on_book(&mut self, key: &BookKey, book: &BookState) {
        let _ = (key, book);
    }

    /// Called with every classified non-book frame.
    fn on_frame(&mut self, frame: FeedFrame) {
        let _ = frame;
    }
}

/// Single-threaded reader loop for one connection.
///
/// Frames are applied strictly in arrival order; incremental updates are
/// only meaningful relative to the immediately preceding accepted state,
/// so the dispatcher never reorders, buffers, or drops silently.
pub struct FeedDispatcher<'a, T: Transport, H: FeedHandler> {
    store: &'a BookStore,
    mux: &'a mut Multiplexer<T>,
    handler: &'a mut H,
}

impl<'a, T: Transport, H: FeedHandler> FeedDispatcher<'a, T, H> {
    pub fn new(store: &'a BookStore, mux: &'a mut Multiplexer<T>, handler: &'a mut H) -> Self {
        Self {
            store,
            mux,
            handler,
        }
    }

    /// Reads and dispatches frames until the stream ends or the socket
    /// errors. Malformed frames are logged and dropped; checksum failures
    /// trigger a resync; transport failures during resync are returned.
    ///
    /// # Errors
    ///
    /// Returns the underlying WebSocket error on read failure, or a
    /// transport error if a resync resubscription could not be sent.
    pub async fn run(&mut self, read: &mut WsReader) -> Result<()> {
        while let Some(msg) = read.next().await {
            self.handle(msg?).await?;
        }

        Ok(())
    }

    /// Handles one raw WebSocket message: skips pongs and non-text
    /// frames, drops malformed frames with a warning, dispatches the
    /// rest.
    ///
    /// # Errors
    ///
    /// Returns a transport error if a triggered resync could not be sent.
    pub async fn handle(&mut self, msg: Message) -> Result<()> {
        if let Message::Text(text) = msg {
            if text == "pong" {
                debug!("received pong");
                return Ok(());
            }
            match self.dispatch_text(&text).await {
                Ok(()) => {}
                Err(BooksyncError::MalformedFrame(reason)) => {
                    warn!(reason, "dropping malformed frame");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Forwards the keepalive ping to every connection the multiplexer
    /// holds.
    ///
    /// # Errors
    ///
    /// Returns the transport error if a send fails.
    pub async fn keepalive(&mut self) -> Result<()> {
        self.mux.keepalive().await
    }

    /// Classifies and routes one text frame.
    pub async fn dispatch_text(&mut self, text: &str) -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| BooksyncError::MalformedFrame(e.to_string()))?;

        match classify(value)? {
            FeedFrame::BookSnapshot(frame) => self.apply_book(frame, true).await,
            FeedFrame::BookUpdate(frame) => self.apply_book(frame, false).await,
            FeedFrame::Event(event) => {
                self.handle_event(&event);
                self.handler.on_frame(FeedFrame::Event(event));
                Ok(())
            }
            other => {
                self.handler.on_frame(other);
                Ok(())
            }
        }
    }

    /// Book lifecycle bookkeeping on subscription acks: created
    /// `Uninitialized` on acceptance, destroyed on unsubscribe.
    fn handle_event(&mut self, event: &EventResponse) {
        let Some(arg) = &event.arg else {
            if event.event == "error" {
                warn!(code = ?event.code, msg = ?event.msg, "feed error event");
            }
            return;
        };
        let Some(channel) = Channel::from_wire(&arg.channel) else {
            return;
        };
        if !channel.is_book() {
            return;
        }
        let Some(inst_id) = &arg.inst_id else {
            return;
        };
        let key = BookKey::new(inst_id.clone(), arg.inst_type.clone());

        match event.event.as_str() {
            "subscribe" => {
                self.store.ensure(&key);
                debug!(book = %key, "book entry created on subscription acceptance");
            }
            "unsubscribe" => {
                self.store.remove(&key);
                debug!(book = %key, "book entry destroyed on unsubscribe");
            }
            _ => {}
        }
    }

    /// Applies one book frame's data entries to the store and publishes
    /// each verified `Live` result. Checksum mismatches and updates for
    /// instruments with no book entry resolve through a resync; updates
    /// for a book already awaiting its snapshot are dropped.
    async fn apply_book(&mut self, frame: BookFrame, snapshot: bool) -> Result<()> {
        let Some(channel) = Channel::from_wire(&frame.arg.channel) else {
            return Err(BooksyncError::MalformedFrame(format!(
                "unknown book channel {:?}",
                frame.arg.channel
            )));
        };
        let key = BookKey::new(frame.arg.inst_id.clone(), frame.arg.inst_type.clone());
        let entry = SubscriptionEntry {
            channel,
            inst_id: Some(frame.arg.inst_id.clone()),
            inst_type: frame.arg.inst_type.clone(),
            ccy: None,
        };

        for data in &frame.data {
            let bids = parse_levels(&data.bids)?;
            let asks = parse_levels(&data.asks)?;

            let applied = if snapshot {
                self.store
                    .load_snapshot(&key, bids, asks, &data.ts, data.checksum)
            } else {
                self.store
                    .apply_update(&key, bids, asks, &data.ts, data.checksum)
            };

            match applied {
                Ok(book) => {
                    // A Resyncing book still returns Ok for empty-diff
                    // heartbeats; only Live state is published.
                    if book.status == BookStatus::Live {
                        self.handler.on_book(&key, &book);
                    }
                }
                Err(BooksyncError::ChecksumMismatch { .. }) => {
                    ResyncController::new(self.store, self.mux)
                        .resync(&entry)
                        .await?;
                }
                Err(BooksyncError::BookNotInitialized(_)) => {
                    // The entry exists but holds no verified snapshot, so
                    // one is already on its way (initial subscribe or a
                    // resync in flight). Stragglers from the old stream
                    // are dropped rather than spawning another resync
                    // round trip.
                    debug!(book = %key, "update while awaiting snapshot, dropped");
                }
                Err(e @ BooksyncError::BookNotFound(_)) => {
                    // An update for an instrument with no book entry at
                    // all: force the feed to resend a snapshot.
                    warn!(book = %key, error = %e, "update without book entry, resyncing");
                    self.store.ensure(&key);
                    ResyncController::new(self.store, self.mux)
                        .resync(&entry)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}
