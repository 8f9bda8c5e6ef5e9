//! Trace processing: pairs a RAM action with its inline transfer side
//! effects and maintains the rolling last-known RAM price.

use crate::event::{parse_quantity, ActionKind, ParseError, RamEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Most recently computed RAM price, with and without fee.
///
/// Written by buyrambytes/sellram processing, read by buyram processing
/// (buyram transfers carry no byte amount, so bytes are derived from this).
/// Seeded from the relational sink at startup; zero on a fresh deployment
/// until the first priced action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceState {
    pub ram_price: f64,
    pub ram_price_inc_fee: f64,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace missing {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("buyram before any priced action (ram price unseeded)")]
    PriceUnseeded,
}

/// A priced action without block context; the poll loop fills in
/// block_num / transaction id / time from the enclosing transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedAction {
    pub action: ActionKind,
    pub payer: String,
    pub receiver: String,
    pub bytes: f64,
    pub tokens: f64,
    pub fee: f64,
    pub ram_price: f64,
    pub ram_price_inc_fee: f64,
    pub global_sequence: u64,
}

impl PricedAction {
    pub fn into_event(self, block_num: u64, trx: String, time: DateTime<Utc>) -> RamEvent {
        RamEvent {
            action: self.action,
            payer: self.payer,
            receiver: self.receiver,
            bytes: self.bytes,
            tokens: self.tokens,
            fee: self.fee,
            ram_price: self.ram_price,
            ram_price_inc_fee: self.ram_price_inc_fee,
            global_sequence: self.global_sequence,
            block_num,
            trx,
            time,
        }
    }
}

fn str_field<'a>(data: &'a Value, key: &'static str) -> Result<&'a str, TraceError> {
    data.get(key)
        .and_then(|s| s.as_str())
        .ok_or(TraceError::Missing(key))
}

/// Transfer quantity of one inline trace.
fn inline_quantity(inline: &Value) -> Result<f64, TraceError> {
    let quantity = inline
        .get("act")
        .and_then(|act| act.get("data"))
        .and_then(|data| data.get("quantity"))
        .and_then(|q| q.as_str())
        .ok_or(TraceError::Missing("inline quantity"))?;
    Ok(parse_quantity(quantity)?)
}

/// tokens (first transfer), fee (second transfer, 0 when absent).
fn tokens_and_fee(inline: &[Value]) -> Result<(f64, f64), TraceError> {
    let tokens = inline_quantity(&inline[0])?;
    let fee = match inline.get(1) {
        Some(second) => inline_quantity(second)?,
        None => 0.0,
    };
    Ok((tokens, fee))
}

fn declared_bytes(data: &Value) -> Result<f64, TraceError> {
    data.get("bytes")
        .and_then(|b| b.as_f64())
        .ok_or(TraceError::Missing("act.data.bytes"))
}

/// Sign mapping for a sale, kept in one place: bytes AND tokens are recorded
/// negated, even though the sale pays tokens to the seller.
fn sellram_signs(bytes: f64, tokens: f64) -> (f64, f64) {
    (-bytes, -tokens)
}

/// Process one action trace against the rolling price state.
///
/// Returns `Ok(None)` for traces with no inline transfers and for action
/// names that produce no event. Errors never mutate `price`: every field is
/// parsed before any state write, so a malformed trace can be skipped
/// without corrupting subsequent pricing.
pub fn process_trace(
    trace: &Value,
    price: &mut PriceState,
) -> Result<Option<PricedAction>, TraceError> {
    let inline = match trace.get("inline_traces").and_then(|t| t.as_array()) {
        Some(traces) if !traces.is_empty() => traces,
        // No transfer side effect to price from.
        _ => return Ok(None),
    };
    let act = trace.get("act").ok_or(TraceError::Missing("act"))?;
    let name = act
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or(TraceError::Missing("act.name"))?;
    let data = act.get("data").ok_or(TraceError::Missing("act.data"))?;
    let global_sequence = trace
        .get("receipt")
        .and_then(|r| r.get("global_sequence"))
        .and_then(|g| g.as_u64())
        .ok_or(TraceError::Missing("receipt.global_sequence"))?;

    match name {
        "buyrambytes" => {
            let (tokens, fee) = tokens_and_fee(inline)?;
            let bytes = declared_bytes(data)?;
            let payer = str_field(data, "payer")?.to_string();
            let receiver = str_field(data, "receiver")?.to_string();
            price.ram_price = tokens / bytes;
            price.ram_price_inc_fee = (tokens + fee) / bytes;
            Ok(Some(PricedAction {
                action: ActionKind::BuyRamBytes,
                payer,
                receiver,
                bytes,
                tokens,
                fee,
                ram_price: price.ram_price,
                ram_price_inc_fee: price.ram_price_inc_fee,
                global_sequence,
            }))
        }
        "sellram" => {
            let (tokens, fee) = tokens_and_fee(inline)?;
            let bytes = declared_bytes(data)?;
            let account = str_field(data, "account")?.to_string();
            price.ram_price = tokens / bytes;
            price.ram_price_inc_fee = (tokens + fee) / bytes;
            let (bytes, tokens) = sellram_signs(bytes, tokens);
            Ok(Some(PricedAction {
                action: ActionKind::SellRam,
                payer: account.clone(),
                receiver: account,
                bytes,
                tokens,
                fee,
                ram_price: price.ram_price,
                ram_price_inc_fee: price.ram_price_inc_fee,
                global_sequence,
            }))
        }
        "buyram" => {
            let (tokens, fee) = tokens_and_fee(inline)?;
            let payer = str_field(data, "payer")?.to_string();
            let receiver = str_field(data, "receiver")?.to_string();
            if price.ram_price == 0.0 {
                return Err(TraceError::PriceUnseeded);
            }
            // Bytes are not reported for buyram; derive them from whatever
            // price the most recent buyrambytes/sellram established.
            let bytes = (tokens + fee) / price.ram_price;
            Ok(Some(PricedAction {
                action: ActionKind::BuyRam,
                payer,
                receiver,
                bytes,
                tokens,
                fee,
                ram_price: price.ram_price,
                ram_price_inc_fee: price.ram_price_inc_fee,
                global_sequence,
            }))
        }
        _ => Ok(None),
    }
}
