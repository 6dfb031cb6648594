//! Recovery from checksum divergence.
//!
//! When a book's local digest stops matching the server's checksum, the
//! only safe recovery is to make the feed treat the instrument as newly
//! subscribed: unsubscribe and immediately resubscribe the same channel,
//! which forces a fresh full snapshot back through
//! [`BookStore::load_snapshot`](crate::book::BookStore::load_snapshot).

use std::slice;

use tracing::{info, warn};

use crate::book::BookStore;
use crate::error::{BooksyncError, Result};
use crate::subscription::{Multiplexer, SubscriptionEntry, Transport};

/// Drives the `Resyncing -> Uninitialized -> Live` recovery path for
/// books that failed checksum verification.
pub struct ResyncController<'a, T: Transport> {
    store: &'a BookStore,
    mux: &'a mut Multiplexer<T>,
}

impl<'a, T: Transport> ResyncController<'a, T> {
    pub fn new(store: &'a BookStore, mux: &'a mut Multiplexer<T>) -> Self {
        Self { store, mux }
    }

    /// Unsubscribes and resubscribes the entry's channel so the feed
    /// resends a full snapshot.
    ///
    /// A successful unsubscribe resets the book to `Uninitialized` with
    /// cleared sides; the pending resubscribe then finds it ready for the
    /// snapshot. If either transport call fails the book stays
    /// `Resyncing` and the error is surfaced — retry policy belongs to
    /// the connection-management layer, not here.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::MalformedFrame`] if the entry is not a
    /// book channel, or the transport error from the failed send.
    pub async fn resync(&mut self, entry: &SubscriptionEntry) -> Result<()> {
        let key = entry.book_key().ok_or_else(|| {
            BooksyncError::MalformedFrame(format!(
                "resync requested for non-book channel {}",
                entry.channel.as_str()
            ))
        })?;

        warn!(book = %key, channel = entry.channel.as_str(), "resyncing order book");

        if let Err(e) = self.mux.unsubscribe(slice::from_ref(entry)).await {
            warn!(book = %key, error = %e, "resync unsubscribe failed, book stays Resyncing");
            return Err(e);
        }
        self.store.reset(&key);

        if let Err(e) = self.mux.subscribe(slice::from_ref(entry)).await {
            warn!(book = %key, error = %e, "resync resubscribe failed");
            return Err(e);
        }

        info!(book = %key, "resubscribed, awaiting fresh snapshot");
        Ok(())
    }
}
