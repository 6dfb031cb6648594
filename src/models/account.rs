//! Account channel models (authenticated).

use rust_decimal::Decimal;
use serde::Deserialize;

/// A frame from the `account` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountFrame {
    pub data: Vec<AccountData>,
}

/// Balance state for the account at one point in time.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    #[serde(rename = "uTime")]
    pub u_time: String,
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

/// Per-currency balance detail.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceDetail {
    pub ccy: String,
    #[serde(rename = "cashBal", with = "rust_decimal::serde::str")]
    pub cash_bal: Decimal,
    #[serde(rename = "availBal", with = "rust_decimal::serde::str")]
    pub avail_bal: Decimal,
    #[serde(rename = "frozenBal", with = "rust_decimal::serde::str")]
    pub frozen_bal: Decimal,
}
