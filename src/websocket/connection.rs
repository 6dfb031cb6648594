//! WebSocket connection lifecycle management.
//!
//! [`ConnectionManager`] owns the public and (when credentials are
//! configured) private connections: it connects, logs in, re-subscribes
//! everything the registry believes active, and runs the reader loop.
//! On any disconnect every book is discarded — frames may have been lost,
//! so a reconnect must treat every instrument as uninitialized until a
//! fresh verified snapshot arrives.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::interval;
use tracing::{error, info, warn};

use super::{WsReader, connect, login};
use crate::Result;
use crate::book::BookStore;
use crate::config::OkxConfig;
use crate::dispatch::{FeedDispatcher, FeedHandler};
use crate::subscription::{Multiplexer, SubscriptionEntry, SubscriptionRegistry};

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// The feed drops connections idle for 30 seconds; ping well inside that.
const PING_INTERVAL: Duration = Duration::from_secs(20);

/// Manages connection lifecycle: connect, login, subscribe, dispatch,
/// and reconnect with exponential backoff.
pub struct ConnectionManager<H: FeedHandler> {
    config: OkxConfig,
    store: Arc<BookStore>,
    registry: Arc<SubscriptionRegistry>,
    /// Subscriptions requested at startup, merged with whatever the
    /// registry holds on each (re)connect.
    initial: Vec<SubscriptionEntry>,
    handler: H,
}

impl<H: FeedHandler> ConnectionManager<H> {
    #[must_use]
    pub fn new(
        config: OkxConfig,
        store: Arc<BookStore>,
        registry: Arc<SubscriptionRegistry>,
        initial: Vec<SubscriptionEntry>,
        handler: H,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            initial,
            handler,
        }
    }

    /// Runs the connection manager loop indefinitely.
    ///
    /// Each round connects, subscribes, and dispatches until the
    /// connection drops; then the book store is cleared and the next
    /// round starts after an exponential backoff.
    pub async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match self.session().await {
                Ok(()) => {
                    info!("connection closed cleanly");
                    backoff = INITIAL_BACKOFF;
                }
                Err(e) => {
                    error!("connection error: {e}");
                }
            }

            // Books cannot survive a disconnect: frames may have been
            // lost while the socket was down.
            self.store.clear();

            info!(backoff_secs = backoff.as_secs(), "backing off before reconnect");
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// One connection round: connect both endpoints, login, resubscribe,
    /// and dispatch until a reader ends or errors.
    async fn session(&mut self) -> Result<()> {
        let (public_write, mut public_read) = connect(&self.config.public_ws_url).await?;
        let mut mux = Multiplexer::new(public_write, self.registry.clone());

        let mut private_read: Option<WsReader> = None;
        if self.config.has_credentials() {
            let (mut write, read) = connect(&self.config.private_ws_url).await?;
            // Credential presence was validated by fetch_config.
            login(
                &mut write,
                self.config.api_key.as_deref().unwrap_or_default(),
                self.config.api_secret.as_deref().unwrap_or_default(),
                self.config.passphrase.as_deref().unwrap_or_default(),
            )
            .await?;
            mux.set_private(write);
            private_read = Some(read);
        }

        // Everything previously active plus the startup set; the
        // multiplexer deduplicates repeated args within the call.
        let mut entries = self.registry.entries();
        entries.extend(self.initial.iter().cloned());
        if !entries.is_empty() {
            mux.subscribe(&entries).await?;
        }
        info!(subscriptions = self.registry.len(), "connected and subscribed");

        let mut dispatcher = FeedDispatcher::new(&self.store, &mut mux, &mut self.handler);
        let mut ping_timer = interval(PING_INTERVAL);
        ping_timer.reset();

        loop {
            tokio::select! {
                msg = public_read.next() => {
                    match msg {
                        Some(msg) => dispatcher.handle(msg?).await?,
                        None => {
                            warn!("public stream ended");
                            return Ok(());
                        }
                    }
                }

                msg = next_private(&mut private_read) => {
                    match msg {
                        Some(msg) => dispatcher.handle(msg?).await?,
                        None => {
                            warn!("private stream ended");
                            return Ok(());
                        }
                    }
                }

                _ = ping_timer.tick() => {
                    dispatcher.keepalive().await?;
                }
            }
        }
    }
}

/// Polls the private reader when present, pending forever otherwise so
/// the select arm never fires for public-only sessions.
async fn next_private(
    read: &mut Option<WsReader>,
) -> Option<std::result::Result<tungstenite::Message, tungstenite::Error>> {
    match read {
        Some(read) => read.next().await,
        None => std::future::pending().await,
    }
}
