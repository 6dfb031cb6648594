//! Own-order update channel models (authenticated).

use rust_decimal::Decimal;
use serde::Deserialize;

/// A frame from the `orders` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderFrame {
    pub arg: super::book::BookArg,
    pub data: Vec<OrderData>,
}

/// State of one of the account's own orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderData {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "ordId")]
    pub ord_id: String,
    #[serde(rename = "clOrdId", default)]
    pub cl_ord_id: Option<String>,
    pub side: String,
    #[serde(rename = "ordType")]
    pub ord_type: String,
    pub state: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub px: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    #[serde(rename = "accFillSz", with = "rust_decimal::serde::str")]
    pub acc_fill_sz: Decimal,
    #[serde(rename = "uTime")]
    pub u_time: String,
}
