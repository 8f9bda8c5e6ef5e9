//! Common helpers for integration tests: an in-memory chain and recording
//! sinks. Some helpers are only used by specific test binaries; allow
//! dead_code to avoid per-binary warnings.
#![allow(dead_code)]

use async_trait::async_trait;
use ramfeed::{ChainError, ChainSource, EventSink, RamEvent, SinkError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Fixed block time used by the builders.
pub const BLOCK_TIME: &str = "2018-06-10T13:22:01.500";

/// In-memory chain serving a fixed set of blocks and transactions. Head
/// heights are served from a sequence so successive cycles can observe an
/// advancing chain; blocks that were never registered come back empty.
pub struct MockChain {
    heads: Vec<u64>,
    head_calls: AtomicU64,
    blocks: HashMap<u64, Value>,
    transactions: HashMap<String, Value>,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        Self::with_heads(vec![head])
    }

    pub fn with_heads(heads: Vec<u64>) -> Self {
        assert!(!heads.is_empty());
        Self {
            heads,
            head_calls: AtomicU64::new(0),
            blocks: HashMap::new(),
            transactions: HashMap::new(),
        }
    }

    pub fn add_block(&mut self, block_num: u64, transactions: Vec<Value>) {
        self.blocks.insert(
            block_num,
            json!({
                "block_num": block_num,
                "timestamp": BLOCK_TIME,
                "transactions": transactions,
            }),
        );
    }

    pub fn add_transaction(&mut self, tx: Value) {
        let id = tx
            .get("id")
            .and_then(|i| i.as_str())
            .expect("transaction body needs an id")
            .to_string();
        self.transactions.insert(id, tx);
    }
}

#[async_trait]
impl ChainSource for MockChain {
    async fn head_block_num(&self) -> Result<u64, ChainError> {
        let call = self.head_calls.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(*self.heads.get(call).unwrap_or_else(|| {
            self.heads.last().expect("heads is non-empty")
        }))
    }

    async fn get_block(&self, block_num: u64) -> Result<Value, ChainError> {
        Ok(self.blocks.get(&block_num).cloned().unwrap_or_else(|| {
            json!({
                "block_num": block_num,
                "timestamp": BLOCK_TIME,
                "transactions": [],
            })
        }))
    }

    async fn get_transaction(&self, id: &str) -> Result<Value, ChainError> {
        self.transactions
            .get(id)
            .cloned()
            .ok_or_else(|| ChainError::Api(format!("unknown transaction {id}")))
    }
}

/// Shared handle onto the batches a [RecordingSink] has accepted.
pub type Batches = Arc<Mutex<Vec<Vec<RamEvent>>>>;

/// Records every batch it is handed; optionally fails the first N writes.
pub struct RecordingSink {
    name: &'static str,
    batches: Batches,
    fail_remaining: AtomicU64,
}

impl RecordingSink {
    pub fn new(name: &'static str) -> (Self, Batches) {
        Self::failing(name, 0)
    }

    pub fn failing(name: &'static str, failures: u64) -> (Self, Batches) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name,
                batches: Arc::clone(&batches),
                fail_remaining: AtomicU64::new(failures),
            },
            batches,
        )
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn write_batch(&mut self, events: &[RamEvent]) -> Result<(), SinkError> {
        if self.fail_remaining.load(Ordering::SeqCst) > 0 {
            self.fail_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(SinkError::Rejected(format!("{} write refused", self.name)));
        }
        self.batches.lock().unwrap().push(events.to_vec());
        Ok(())
    }
}

/// Block-level transaction entry as get_block returns it.
pub fn block_tx(status: &str, id: &str, action_names: &[&str]) -> Value {
    json!({
        "status": status,
        "trx": {
            "id": id,
            "transaction": {
                "actions": action_names
                    .iter()
                    .map(|name| json!({"account": "eosio", "name": name}))
                    .collect::<Vec<_>>(),
            }
        }
    })
}

/// Transaction body as get_transaction returns it.
pub fn tx_body(id: &str, block_num: u64, traces: Vec<Value>) -> Value {
    json!({
        "id": id,
        "block_num": block_num,
        "block_time": BLOCK_TIME,
        "traces": traces,
    })
}

/// Inline token-transfer trace.
pub fn transfer(quantity: &str) -> Value {
    json!({
        "act": {
            "account": "eosio.token",
            "name": "transfer",
            "data": {"quantity": quantity},
        }
    })
}

fn with_fee(tokens: &str, fee: Option<&str>) -> Vec<Value> {
    let mut inline = vec![transfer(tokens)];
    if let Some(fee) = fee {
        inline.push(transfer(fee));
    }
    inline
}

pub fn buyrambytes_trace(
    seq: u64,
    payer: &str,
    receiver: &str,
    bytes: u64,
    tokens: &str,
    fee: Option<&str>,
) -> Value {
    json!({
        "receipt": {"global_sequence": seq},
        "act": {
            "account": "eosio",
            "name": "buyrambytes",
            "data": {"payer": payer, "receiver": receiver, "bytes": bytes},
        },
        "inline_traces": with_fee(tokens, fee),
    })
}

pub fn buyram_trace(
    seq: u64,
    payer: &str,
    receiver: &str,
    quant: &str,
    fee: Option<&str>,
) -> Value {
    json!({
        "receipt": {"global_sequence": seq},
        "act": {
            "account": "eosio",
            "name": "buyram",
            "data": {"payer": payer, "receiver": receiver, "quant": quant},
        },
        "inline_traces": with_fee(quant, fee),
    })
}

pub fn sellram_trace(seq: u64, account: &str, bytes: u64, tokens: &str, fee: Option<&str>) -> Value {
    json!({
        "receipt": {"global_sequence": seq},
        "act": {
            "account": "eosio",
            "name": "sellram",
            "data": {"account": account, "bytes": bytes},
        },
        "inline_traces": with_fee(tokens, fee),
    })
}
