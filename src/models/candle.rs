//! OHLC candlestick channel models.
//!
//! Candle data arrives as positional string arrays:
//! `[ts, open, high, low, close, volume, volCcy, volCcyQuote, confirm]`.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{BooksyncError, Result};

/// A frame from a `candle*` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleFrame {
    pub arg: super::book::BookArg,
    pub data: Vec<Vec<String>>,
}

/// A single OHLC bar decoded from its positional array.
#[derive(Debug, Clone)]
pub struct CandleData {
    pub ts: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl CandleData {
    /// Decodes one positional candle array.
    ///
    /// # Errors
    ///
    /// Returns [`BooksyncError::MalformedFrame`] if the array is too short
    /// or a field fails to parse.
    pub fn from_raw(raw: &[String]) -> Result<CandleData> {
        if raw.len() < 6 {
            return Err(BooksyncError::MalformedFrame(format!(
                "candle array has {} elements, expected at least 6",
                raw.len()
            )));
        }
        let dec = |i: usize| -> Result<Decimal> {
            raw[i]
                .parse()
                .map_err(|e| BooksyncError::MalformedFrame(format!("bad candle field {i}: {e}")))
        };

        Ok(CandleData {
            ts: raw[0].clone(),
            open: dec(1)?,
            high: dec(2)?,
            low: dec(3)?,
            close: dec(4)?,
            volume: dec(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn decodes_positional_array() {
        let bar = CandleData::from_raw(&raw(&[
            "1700000000000",
            "50000",
            "50100.5",
            "49900",
            "50050",
            "12.5",
            "625625",
            "625625",
            "1",
        ]))
        .unwrap();
        assert_eq!(bar.ts, "1700000000000");
        assert_eq!(bar.open, dec!(50000));
        assert_eq!(bar.high, dec!(50100.5));
        assert_eq!(bar.low, dec!(49900));
        assert_eq!(bar.close, dec!(50050));
        assert_eq!(bar.volume, dec!(12.5));
    }

    #[test]
    fn rejects_short_arrays() {
        let err = CandleData::from_raw(&raw(&["1700000000000", "50000"])).unwrap_err();
        assert!(matches!(err, BooksyncError::MalformedFrame(_)));
    }

    #[test]
    fn rejects_unparseable_fields() {
        let err =
            CandleData::from_raw(&raw(&["1700000000000", "open", "1", "1", "1", "1"])).unwrap_err();
        assert!(matches!(err, BooksyncError::MalformedFrame(_)));
    }
}
