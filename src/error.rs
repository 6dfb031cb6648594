//! Crate-level error types.
//!
//! [`BooksyncError`] unifies every error source (configuration, WebSocket,
//! JSON, book synchronization) behind a single enum so callers can match on
//! the variant they care about while still using the `?` operator for easy
//! propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BooksyncError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BooksyncError {
    /// Configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The locally computed book digest disagrees with the server's
    /// checksum. Non-fatal: the book is marked for resync.
    #[error("checksum mismatch for {inst_id}: local {local}, server {server}")]
    ChecksumMismatch {
        inst_id: String,
        local: u32,
        server: i64,
    },

    /// A single frame could not be decoded (bad price/size encoding).
    /// The frame is dropped; book state is unaffected.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// No book exists for the requested instrument; subscribe first.
    #[error("no book for {0}")]
    BookNotFound(String),

    /// An incremental update arrived before any verified snapshot.
    #[error("book for {0} not initialized; snapshot required")]
    BookNotInitialized(String),

    /// Sending a subscribe/unsubscribe batch failed. The registry is left
    /// unchanged for the failed batch.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An authenticated channel was used before a successful login.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
}
