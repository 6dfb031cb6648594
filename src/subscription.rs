//! Subscription batching and the registry of active subscriptions.
//!
//! The [`Multiplexer`] turns logical subscribe/unsubscribe requests into
//! wire envelopes that never exceed the feed's accepted message size,
//! routing authenticated entries over the private connection and public
//! entries over the public one. The [`SubscriptionRegistry`] records what
//! the process believes is active; it is mutated only after a batch is
//! confirmed sent, never speculatively.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::book::BookKey;
use crate::error::{BooksyncError, Result};
use crate::models::{Channel, SubscriptionArg, WsRequest};

/// Maximum serialized envelope size accepted by the feed.
pub const MAX_ENVELOPE_BYTES: usize = 4096;

/// A logical subscription request. Identity is the full tuple; the account
/// channel uses only `ccy`, instrument channels use `inst_id`/`inst_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionEntry {
    pub channel: Channel,
    pub inst_id: Option<String>,
    pub inst_type: Option<String>,
    pub ccy: Option<String>,
}

impl SubscriptionEntry {
    /// Entry for an instrument-keyed channel (book, ticker, trades, ...).
    pub fn instrument(channel: Channel, inst_id: impl Into<String>) -> Self {
        Self {
            channel,
            inst_id: Some(inst_id.into()),
            inst_type: None,
            ccy: None,
        }
    }

    /// Entry for the account channel, keyed by currency code.
    pub fn currency(channel: Channel, ccy: impl Into<String>) -> Self {
        Self {
            channel,
            inst_id: None,
            inst_type: None,
            ccy: Some(ccy.into()),
        }
    }

    pub fn with_inst_type(mut self, inst_type: impl Into<String>) -> Self {
        self.inst_type = Some(inst_type.into());
        self
    }

    /// `true` if this entry must travel over the private connection.
    pub fn requires_auth(&self) -> bool {
        self.channel.requires_auth()
    }

    /// The wire argument object for this entry.
    pub fn arg(&self) -> SubscriptionArg {
        SubscriptionArg {
            channel: self.channel.as_str().to_string(),
            inst_id: self.inst_id.clone(),
            inst_type: self.inst_type.clone(),
            ccy: self.ccy.clone(),
        }
    }

    /// The store key for book-channel entries.
    pub fn book_key(&self) -> Option<BookKey> {
        if !self.channel.is_book() {
            return None;
        }
        self.inst_id
            .as_ref()
            .map(|id| BookKey::new(id.clone(), self.inst_type.clone()))
    }
}

/// Process-wide set of subscriptions currently believed active.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashSet<SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entry: &SubscriptionEntry) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(entry)
    }

    /// Snapshot of the active entries, for resubscription after reconnect.
    pub fn entries(&self) -> Vec<SubscriptionEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_all(&self, batch: &[SubscriptionEntry]) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in batch {
            entries.insert(entry.clone());
        }
    }

    fn remove_all(&self, batch: &[SubscriptionEntry]) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in batch {
            entries.remove(entry);
        }
    }
}

/// Sends one serialized envelope. Implemented for the WebSocket writer;
/// tests substitute an in-memory recorder.
pub trait Transport {
    fn send_json(&mut self, payload: String) -> impl Future<Output = Result<()>> + Send;
}

/// The batch operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Subscribe,
    Unsubscribe,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Subscribe => "subscribe",
            Op::Unsubscribe => "unsubscribe",
        }
    }
}

/// Accumulates one envelope's worth of args for one auth class.
#[derive(Default)]
struct PendingBatch {
    args: Vec<SubscriptionArg>,
    entries: Vec<SubscriptionEntry>,
}

/// Batches subscribe/unsubscribe requests into byte-bounded envelopes and
/// reconciles confirmed sends into the registry.
pub struct Multiplexer<T: Transport> {
    public: T,
    /// Present only after a successful login on the private connection.
    private: Option<T>,
    registry: Arc<SubscriptionRegistry>,
    max_envelope_bytes: usize,
}

impl<T: Transport> Multiplexer<T> {
    #[must_use]
    pub fn new(public: T, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            public,
            private: None,
            registry,
            max_envelope_bytes: MAX_ENVELOPE_BYTES,
        }
    }

    /// Attaches the authenticated connection's transport after login.
    pub fn set_private(&mut self, private: T) {
        self.private = Some(private);
    }

    /// Overrides the envelope size bound. Intended for tests.
    pub fn with_max_envelope_bytes(mut self, max: usize) -> Self {
        self.max_envelope_bytes = max;
        self
    }

    /// Subscribes to the given entries, adding each confirmed batch to the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::NotAuthenticated`] before any transport
    /// call if an authenticated entry is present without a login, or a
    /// transport error for the batch that failed to send. Batches flushed
    /// before the failure stay registered: partial success across multiple
    /// flushes within one call is possible.
    pub async fn subscribe(&mut self, entries: &[SubscriptionEntry]) -> Result<()> {
        self.send_batched(Op::Subscribe, entries).await
    }

    /// Unsubscribes from the given entries, removing each confirmed batch
    /// from the registry. Same error and partial-success semantics as
    /// [`subscribe`](Self::subscribe).
    pub async fn unsubscribe(&mut self, entries: &[SubscriptionEntry]) -> Result<()> {
        self.send_batched(Op::Unsubscribe, entries).await
    }

    /// Sends the feed's plain-text ping on every held connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if a send fails.
    pub async fn keepalive(&mut self) -> Result<()> {
        self.public.send_json("ping".to_string()).await?;
        if let Some(private) = &mut self.private {
            private.send_json("ping".to_string()).await?;
        }
        Ok(())
    }

    /// Greedy byte-bounded batching: each entry's arg is tentatively added
    /// to its auth class's envelope; when the serialized envelope would
    /// exceed the bound, the envelope *without* that arg is flushed and the
    /// arg starts the next batch. Non-empty envelopes get one final flush.
    async fn send_batched(&mut self, op: Op, entries: &[SubscriptionEntry]) -> Result<()> {
        if entries.iter().any(SubscriptionEntry::requires_auth) && self.private.is_none() {
            return Err(BooksyncError::NotAuthenticated(format!(
                "{} includes private-channel entries but no login is active",
                op.as_str()
            )));
        }

        let mut public_batch = PendingBatch::default();
        let mut private_batch = PendingBatch::default();
        // The same arg is never sent twice in one call, e.g. the account
        // channel's ccy arg repeated across pairs sharing a currency.
        let mut seen = HashSet::new();

        for entry in entries {
            let arg = entry.arg();
            if !seen.insert(arg.clone()) {
                debug!(?arg, "duplicate arg skipped");
                continue;
            }

            let private = entry.requires_auth();
            let batch = if private {
                &mut private_batch
            } else {
                &mut public_batch
            };

            batch.args.push(arg);
            batch.entries.push(entry.clone());

            let size = envelope_size(op, &batch.args)?;
            if size <= self.max_envelope_bytes {
                continue;
            }

            if batch.args.len() == 1 {
                // A lone arg cannot be split further; send it oversized.
                warn!(
                    size,
                    max = self.max_envelope_bytes,
                    "single subscription arg exceeds envelope bound"
                );
                self.flush(op, private, batch).await?;
                continue;
            }

            // Flush everything before this arg, then restart the batch
            // with the arg that overflowed it.
            let arg = batch.args.pop().expect("non-empty batch");
            let entry = batch.entries.pop().expect("non-empty batch");
            self.flush(op, private, batch).await?;
            batch.args.push(arg);
            batch.entries.push(entry);
        }

        if !public_batch.args.is_empty() {
            self.flush(op, false, &mut public_batch).await?;
        }
        if !private_batch.args.is_empty() {
            self.flush(op, true, &mut private_batch).await?;
        }
        Ok(())
    }

    /// Sends one envelope and, on success, reconciles its entries into the
    /// registry. The batch is cleared either way; a failed batch's entries
    /// are never registered.
    async fn flush(&mut self, op: Op, private: bool, batch: &mut PendingBatch) -> Result<()> {
        let args = std::mem::take(&mut batch.args);
        let entries = std::mem::take(&mut batch.entries);
        let payload = serde_json::to_string(&WsRequest::new(op.as_str(), args))?;

        let transport = if private {
            self.private
                .as_mut()
                .ok_or_else(|| BooksyncError::NotAuthenticated("no private connection".into()))?
        } else {
            &mut self.public
        };
        transport.send_json(payload).await?;

        match op {
            Op::Subscribe => self.registry.insert_all(&entries),
            Op::Unsubscribe => self.registry.remove_all(&entries),
        }
        info!(
            op = op.as_str(),
            private,
            count = entries.len(),
            "flushed subscription batch"
        );
        Ok(())
    }
}

/// Serialized size of the envelope `{op, args}` in bytes.
fn envelope_size(op: Op, args: &[SubscriptionArg]) -> Result<usize> {
    let request = WsRequest {
        op: op.as_str().to_string(),
        args: args.to_vec(),
    };
    Ok(serde_json::to_string(&request)?.len())
}
