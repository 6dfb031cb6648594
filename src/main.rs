use std::sync::Arc;

use tracing::{debug, info};

use booksync::BooksyncError;
use booksync::book::{BookKey, BookState, BookStore};
use booksync::config::fetch_config;
use booksync::dispatch::{FeedFrame, FeedHandler};
use booksync::models::Channel;
use booksync::subscription::{SubscriptionEntry, SubscriptionRegistry};
use booksync::websocket::connection::ConnectionManager;

/// Logs verified books and passes everything else to `tracing`.
struct LogHandler;

impl FeedHandler for LogHandler {
    fn on_book(&mut self, key: &BookKey, book: &BookState) {
        info!(
            book = %key,
            bids = book.bids.len(),
            asks = book.asks.len(),
            best_bid = book.best_bid().map(|l| l.price.to_string()),
            best_ask = book.best_ask().map(|l| l.price.to_string()),
            ts = book.last_update_time,
            "book verified"
        );
    }

    fn on_frame(&mut self, frame: FeedFrame) {
        match frame {
            FeedFrame::Event(event) => info!(event = event.event, arg = ?event.arg, "feed event"),
            other => debug!(frame = ?other, "unrouted frame"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BooksyncError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let store = Arc::new(BookStore::new(app_config.okx.checksum_width));
    let registry = Arc::new(SubscriptionRegistry::new());
    let initial = vec![
        SubscriptionEntry::instrument(Channel::Books, "BTC-USDT"),
        SubscriptionEntry::instrument(Channel::Tickers, "BTC-USDT"),
        SubscriptionEntry::instrument(Channel::Trades, "BTC-USDT"),
    ];

    ConnectionManager::new(app_config.okx, store, registry, initial, LogHandler)
        .run()
        .await;

    Ok(())
}
