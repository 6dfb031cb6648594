//! Per-instrument order book state and the store that owns it.
//!
//! Books move through `Uninitialized -> Live -> Resyncing`: a book becomes
//! `Live` only after a snapshot passes checksum verification, and drops to
//! `Resyncing` the moment an incremental merge disagrees with the server's
//! checksum. Merged-but-unverified state is never committed; a failed
//! verification leaves the previously verified book in place.
//!
//! Each book sits behind its own mutex so different instruments can be
//! processed concurrently while all mutations of one instrument stay
//! serialized in arrival order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::checksum::{ChecksumWidth, digest};
use crate::error::{BooksyncError, Result};
use crate::models::book::PriceLevel;

/// Identifies one book: instrument plus optional market segment
/// (`SPOT`, `SWAP`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookKey {
    pub inst_id: String,
    pub inst_type: Option<String>,
}

impl BookKey {
    pub fn new(inst_id: impl Into<String>, inst_type: Option<String>) -> Self {
        Self {
            inst_id: inst_id.into(),
            inst_type,
        }
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inst_type {
            Some(t) => write!(f, "{}/{}", self.inst_id, t),
            None => write!(f, "{}", self.inst_id),
        }
    }
}

/// Synchronization state of a single book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookStatus {
    /// Created but no verified snapshot yet; updates are rejected.
    #[default]
    Uninitialized,
    /// Snapshot verified; local digest matches the last server checksum.
    Live,
    /// Checksum mismatch detected; awaiting a fresh snapshot.
    Resyncing,
}

/// One instrument's order book.
///
/// Bids are strictly descending by price, asks strictly ascending, with at
/// most one level per price.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    pub status: BookStatus,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    /// Server timestamp of the most recently applied frame.
    pub last_update_time: String,
}

impl BookState {
    /// Best bid, if any.
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Best ask, if any.
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}

/// Store of all live books for one connection.
///
/// The outer map lock is held only to locate a book; all per-book work
/// happens under that book's own mutex.
pub struct BookStore {
    books: RwLock<HashMap<BookKey, Arc<Mutex<BookState>>>>,
    width: ChecksumWidth,
}

impl BookStore {
    #[must_use]
    pub fn new(width: ChecksumWidth) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            width,
        }
    }

    /// Creates an `Uninitialized` entry for the key if none exists.
    /// Called on subscription acceptance and by `load_snapshot`.
    pub fn ensure(&self, key: &BookKey) -> Arc<Mutex<BookState>> {
        if let Some(book) = self.lookup(key) {
            return book;
        }
        let mut books = self
            .books
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        books
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(BookState::default())))
            .clone()
    }

    fn lookup(&self, key: &BookKey) -> Option<Arc<Mutex<BookState>>> {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Replaces the book's sides with a full snapshot and verifies it
    /// against the server checksum before adopting it.
    ///
    /// The supplied levels are trusted to arrive sorted; ordering is
    /// asserted in debug builds. On a checksum mismatch the snapshot is
    /// **not** adopted and the prior state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::ChecksumMismatch`] if the digest of the
    /// new levels disagrees with `server_checksum`.
    pub fn load_snapshot(
        &self,
        key: &BookKey,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        ts: &str,
        server_checksum: Option<i64>,
    ) -> Result<BookState> {
        debug_assert!(
            bids.windows(2).all(|w| w[0].price > w[1].price),
            "snapshot bids not strictly descending"
        );
        debug_assert!(
            asks.windows(2).all(|w| w[0].price < w[1].price),
            "snapshot asks not strictly ascending"
        );

        let local = digest(&bids, &asks);
        if let Some(wire) = server_checksum
            && !self.width.matches(local, wire)
        {
            warn!(
                book = %key,
                local,
                server = wire,
                "snapshot checksum mismatch, snapshot rejected"
            );
            return Err(BooksyncError::ChecksumMismatch {
                inst_id: key.inst_id.clone(),
                local,
                server: wire,
            });
        }

        let book = self.ensure(key);
        let mut state = book.lock().unwrap_or_else(PoisonError::into_inner);
        state.bids = bids;
        state.asks = asks;
        state.last_update_time = ts.to_string();
        state.status = BookStatus::Live;
        debug!(book = %key, bids = state.bids.len(), asks = state.asks.len(), "snapshot verified");

        Ok(state.clone())
    }

    /// Merges incremental diffs into the book and verifies the result.
    ///
    /// Diffs with size zero delete the level at that price (absence is not
    /// an error); all others upsert at the sort-preserving position. Empty
    /// diff lists are a no-op success (idle heartbeat frames) and do not
    /// touch `last_update_time`. The merge happens on a working copy: a
    /// failed verification commits nothing except the `Resyncing` status.
    ///
    /// # Errors
    ///
    /// - [`BooksyncError::BookNotFound`] if no entry exists for the key.
    /// - [`BooksyncError::BookNotInitialized`] if no snapshot has been
    ///   verified yet.
    /// - [`BooksyncError::ChecksumMismatch`] if the merged book disagrees
    ///   with `server_checksum`; the book is marked [`BookStatus::Resyncing`].
    pub fn apply_update(
        &self,
        key: &BookKey,
        bid_diffs: Vec<PriceLevel>,
        ask_diffs: Vec<PriceLevel>,
        ts: &str,
        server_checksum: Option<i64>,
    ) -> Result<BookState> {
        let book = self
            .lookup(key)
            .ok_or_else(|| BooksyncError::BookNotFound(key.to_string()))?;
        let mut state = book.lock().unwrap_or_else(PoisonError::into_inner);

        if state.status == BookStatus::Uninitialized {
            return Err(BooksyncError::BookNotInitialized(key.to_string()));
        }
        if bid_diffs.is_empty() && ask_diffs.is_empty() {
            return Ok(state.clone());
        }

        let mut bids = state.bids.clone();
        let mut asks = state.asks.clone();
        for diff in bid_diffs {
            merge_level(&mut bids, diff, Side::Bid);
        }
        for diff in ask_diffs {
            merge_level(&mut asks, diff, Side::Ask);
        }

        let local = digest(&bids, &asks);
        if let Some(wire) = server_checksum
            && !self.width.matches(local, wire)
        {
            state.status = BookStatus::Resyncing;
            warn!(
                book = %key,
                local,
                server = wire,
                "book checksum mismatch, marking for resync"
            );
            return Err(BooksyncError::ChecksumMismatch {
                inst_id: key.inst_id.clone(),
                local,
                server: wire,
            });
        }

        state.bids = bids;
        state.asks = asks;
        state.last_update_time = ts.to_string();
        Ok(state.clone())
    }

    /// Returns a copy of the current book state.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::BookNotFound`] if the instrument has no
    /// store entry; subscribe first.
    pub fn get(&self, key: &BookKey) -> Result<BookState> {
        let book = self
            .lookup(key)
            .ok_or_else(|| BooksyncError::BookNotFound(key.to_string()))?;
        let state = book.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.clone())
    }

    /// Clears the book back to `Uninitialized` with empty sides, keeping
    /// the entry. Used when a resync unsubscribe succeeds and the fresh
    /// snapshot has not arrived yet.
    pub fn reset(&self, key: &BookKey) {
        if let Some(book) = self.lookup(key) {
            let mut state = book.lock().unwrap_or_else(PoisonError::into_inner);
            *state = BookState::default();
        }
    }

    /// Destroys the book entry. Used when the instrument is unsubscribed.
    pub fn remove(&self, key: &BookKey) {
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Destroys every book. Must be called on disconnect: frames may have
    /// been lost, so resuming incremental updates against pre-disconnect
    /// state is unsafe.
    pub fn clear(&self) {
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of tracked books.
    pub fn len(&self) -> usize {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy)]
enum Side {
    Bid,
    Ask,
}

/// Applies one diff entry to a sorted side: delete on size zero, sorted
/// upsert otherwise.
fn merge_level(levels: &mut Vec<PriceLevel>, diff: PriceLevel, side: Side) {
    // Bids descend, asks ascend; the comparator mirrors the sort order.
    let pos = levels.binary_search_by(|l| match side {
        Side::Bid => diff.price.cmp(&l.price),
        Side::Ask => l.price.cmp(&diff.price),
    });

    if diff.size.is_zero() {
        if let Ok(i) = pos {
            levels.remove(i);
        }
        return;
    }

    match pos {
        Ok(i) => levels[i] = diff,
        Err(i) => levels.insert(i, diff),
    }
}
