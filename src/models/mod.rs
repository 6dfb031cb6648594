//! Shared models for OKX v5 WebSocket messages.
//!
//! Contains channel definitions, subscribe/unsubscribe envelope types,
//! and common protocol messages (event acks, login).

pub mod account;
pub mod book;
pub mod candle;
pub mod order;
pub mod ticker;
pub mod trade;

use serde::{Deserialize, Serialize};

/// Channels on the OKX v5 WebSocket feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Full-depth order book (400 levels, checksummed).
    Books,
    /// Top-50 tick-by-tick order book (checksummed).
    Books50Tbt,
    /// Full-depth tick-by-tick order book (checksummed).
    BooksL2Tbt,
    /// Top-5 order book; every frame is a full snapshot, no checksum.
    Books5,
    /// Best bid/offer tick-by-tick; full snapshot, no checksum.
    BboTbt,
    Tickers,
    Trades,
    /// OHLC candlesticks (wire name: `"candle1m"`).
    Candles,
    /// Account balance updates (authenticated, keyed by currency).
    Account,
    /// Own-order updates (authenticated).
    Orders,
}

impl Channel {
    /// Returns the wire-format channel name expected by the OKX API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Books => "books",
            Channel::Books50Tbt => "books50-l2-tbt",
            Channel::BooksL2Tbt => "books-l2-tbt",
            Channel::Books5 => "books5",
            Channel::BboTbt => "bbo-tbt",
            Channel::Tickers => "tickers",
            Channel::Trades => "trades",
            Channel::Candles => "candle1m",
            Channel::Account => "account",
            Channel::Orders => "orders",
        }
    }

    /// Looks up a channel by its wire name.
    pub fn from_wire(name: &str) -> Option<Channel> {
        match name {
            "books" => Some(Channel::Books),
            "books50-l2-tbt" => Some(Channel::Books50Tbt),
            "books-l2-tbt" => Some(Channel::BooksL2Tbt),
            "books5" => Some(Channel::Books5),
            "bbo-tbt" => Some(Channel::BboTbt),
            "tickers" => Some(Channel::Tickers),
            "trades" => Some(Channel::Trades),
            "candle1m" => Some(Channel::Candles),
            "account" => Some(Channel::Account),
            "orders" => Some(Channel::Orders),
            _ => None,
        }
    }

    /// `true` for order-book channel variants. They differ only in depth
    /// and update cadence, not in protocol.
    pub fn is_book(&self) -> bool {
        matches!(
            self,
            Channel::Books
                | Channel::Books50Tbt
                | Channel::BooksL2Tbt
                | Channel::Books5
                | Channel::BboTbt
        )
    }

    /// `true` for channels that require a logged-in private connection.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Channel::Account | Channel::Orders)
    }

    /// Book depth for channels that do not tag snapshot vs update.
    /// A frame carrying at least this many levels in total is a snapshot.
    pub fn snapshot_depth(&self) -> Option<usize> {
        match self {
            Channel::Books5 => Some(5),
            Channel::BboTbt => Some(1),
            _ => None,
        }
    }
}

/// One argument of a subscribe/unsubscribe envelope.
///
/// Channel-specific: book/ticker/trade args carry `inst_id`, the account
/// channel carries only `ccy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionArg {
    pub channel: String,
    #[serde(rename = "instId", skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
    #[serde(rename = "instType", skip_serializing_if = "Option::is_none")]
    pub inst_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccy: Option<String>,
}

/// A `subscribe`/`unsubscribe` envelope sent to the OKX WebSocket API.
#[derive(Debug, Clone, Serialize)]
pub struct WsRequest {
    pub op: String,
    pub args: Vec<SubscriptionArg>,
}

impl WsRequest {
    pub fn new(op: &str, args: Vec<SubscriptionArg>) -> Self {
        Self {
            op: op.to_string(),
            args,
        }
    }
}

/// A `login` request for the private connection.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub op: String,
    pub args: Vec<LoginArg>,
}

/// Signed credentials carried by a [`LoginRequest`].
#[derive(Debug, Serialize)]
pub struct LoginArg {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub sign: String,
}

/// Event acknowledgement sent by the server for subscribe/unsubscribe/login
/// operations, and for protocol errors.
#[derive(Debug, Clone, Deserialize)]
pub struct EventResponse {
    pub event: String,
    #[serde(default)]
    pub arg: Option<SubscriptionArg>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(rename = "connId", default)]
    pub conn_id: Option<String>,
}
