//! Event model: RAM trade kinds, the priced event record, and the asset and
//! block-time formats the node emits.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// RAM trade variants that produce a priced event.
///
/// `sellrambytes` exists on chain and passes the transaction filter, but no
/// event is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    BuyRamBytes,
    BuyRam,
    SellRam,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::BuyRamBytes => "buyrambytes",
            ActionKind::BuyRam => "buyram",
            ActionKind::SellRam => "sellram",
        }
    }
}

/// One priced RAM trade, ready for both sinks.
///
/// Sign convention: `bytes` and `tokens` are negative for a sale. For buyram
/// the byte count is derived from the rolling price, not observed on chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RamEvent {
    pub action: ActionKind,
    pub payer: String,
    pub receiver: String,
    pub bytes: f64,
    pub tokens: f64,
    pub fee: f64,
    pub ram_price: f64,
    pub ram_price_inc_fee: f64,
    pub global_sequence: u64,
    pub block_num: u64,
    pub trx: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bad asset quantity {0:?}")]
    Quantity(String),
    #[error("bad block time {0:?}")]
    BlockTime(String),
}

/// Numeric part of an asset string (`"1.0050 EOS"` → 1.005).
pub fn parse_quantity(s: &str) -> Result<f64, ParseError> {
    s.split_whitespace()
        .next()
        .and_then(|amount| amount.parse::<f64>().ok())
        .ok_or_else(|| ParseError::Quantity(s.to_string()))
}

/// Node block times are ISO-8601 without a zone suffix, UTC implied.
pub fn parse_block_time(s: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ParseError::BlockTime(s.to_string()))
}
