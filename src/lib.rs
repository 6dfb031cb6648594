//! Checksum-verified order book synchronization for the OKX v5 WebSocket feed.
//!
//! Keeps local order books in lockstep with the exchange's push feed:
//! every snapshot and incremental update is verified against the server's
//! CRC-32 checksum, subscribe/unsubscribe requests are batched into
//! byte-bounded envelopes, and a checksum mismatch triggers an automatic
//! resubscription so the feed resends a fresh snapshot.

pub mod auth;
pub mod book;
pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod resync;
pub mod subscription;
pub mod websocket;

pub use error::{BooksyncError, Result};
