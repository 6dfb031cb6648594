//! Ticker channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A frame from the `tickers` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerFrame {
    pub arg: super::book::BookArg,
    pub data: Vec<TickerData>,
}

/// Best bid/ask and 24h statistics for one instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub last: Decimal,
    #[serde(rename = "lastSz", with = "rust_decimal::serde::str")]
    pub last_sz: Decimal,
    #[serde(rename = "askPx", with = "rust_decimal::serde::str")]
    pub ask_px: Decimal,
    #[serde(rename = "askSz", with = "rust_decimal::serde::str")]
    pub ask_sz: Decimal,
    #[serde(rename = "bidPx", with = "rust_decimal::serde::str")]
    pub bid_px: Decimal,
    #[serde(rename = "bidSz", with = "rust_decimal::serde::str")]
    pub bid_sz: Decimal,
    #[serde(rename = "open24h", with = "rust_decimal::serde::str")]
    pub open_24h: Decimal,
    #[serde(rename = "high24h", with = "rust_decimal::serde::str")]
    pub high_24h: Decimal,
    #[serde(rename = "low24h", with = "rust_decimal::serde::str")]
    pub low_24h: Decimal,
    #[serde(rename = "vol24h", with = "rust_decimal::serde::str")]
    pub vol_24h: Decimal,
    pub ts: String,
}
