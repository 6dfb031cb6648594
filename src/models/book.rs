//! Order book channel models.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{BooksyncError, Result};

/// A raw wire-format level: `["price", "size", ...]`. OKX appends extra
/// elements (liquidated orders, order count) that play no part in book
/// state or checksums.
pub type RawLevel = Vec<String>;

/// A frame from any of the order-book channels.
#[derive(Debug, Clone, Deserialize)]
pub struct BookFrame {
    pub arg: BookArg,
    /// `"snapshot"` or `"update"` for the checksummed channels; absent on
    /// books5/bbo-tbt, which are full-state every frame.
    #[serde(default)]
    pub action: Option<String>,
    pub data: Vec<BookData>,
}

/// Channel identification for a book frame.
#[derive(Debug, Clone, Deserialize)]
pub struct BookArg {
    pub channel: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "instType", default)]
    pub inst_type: Option<String>,
}

/// Order book snapshot or incremental update for a single instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct BookData {
    pub asks: Vec<RawLevel>,
    pub bids: Vec<RawLevel>,
    pub ts: String,
    /// CRC-32 over the top-25 levels. Historically transmitted as either a
    /// signed or unsigned 32-bit integer, so it is held widened here.
    #[serde(default)]
    pub checksum: Option<i64>,
    #[serde(rename = "seqId", default)]
    pub seq_id: Option<i64>,
}

/// A single price level in the order book.
///
/// `Decimal` preserves the scale of the source string, so re-rendering a
/// level yields exactly the text the feed sent — which the checksum
/// depends on. A size of zero is a deletion marker on incremental
/// updates, never a valid resting level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl PriceLevel {
    /// Parses the first two elements of a raw wire level.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::MalformedFrame`] if either field is
    /// missing or fails to parse as a decimal.
    pub fn from_raw(raw: &RawLevel) -> Result<PriceLevel> {
        let price = raw
            .first()
            .ok_or_else(|| BooksyncError::MalformedFrame("level missing price".into()))?;
        let size = raw
            .get(1)
            .ok_or_else(|| BooksyncError::MalformedFrame("level missing size".into()))?;

        Ok(PriceLevel {
            price: price
                .parse()
                .map_err(|e| BooksyncError::MalformedFrame(format!("bad price {price:?}: {e}")))?,
            size: size
                .parse()
                .map_err(|e| BooksyncError::MalformedFrame(format!("bad size {size:?}: {e}")))?,
        })
    }
}

/// Parses a full side of raw levels, preserving wire order.
pub fn parse_levels(raw: &[RawLevel]) -> Result<Vec<PriceLevel>> {
    raw.iter().map(PriceLevel::from_raw).collect()
}
