//! Trade channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A frame from the `trades` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeFrame {
    pub arg: super::book::BookArg,
    pub data: Vec<TradeData>,
}

/// A single executed trade.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub px: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    /// Taker direction: `"buy"` or `"sell"`.
    pub side: String,
    pub ts: String,
}
