//! ramfeed: EOSIO RAM-market event grabber.
//!
//! Follows finalized blocks from one node, extracts RAM trade actions
//! (buyrambytes / buyram / sellram), pairs each with its inline token
//! transfers to derive pricing, and writes the priced event stream to an
//! InfluxDB measurement and a PostgreSQL table. Restarts resume from the
//! highest block the relational sink has durably recorded.
//!
//! - **NodeClient / ChainSource**: head height, block, and transaction
//!   fetch.
//! - **process_trace / PriceState**: the extraction and price-tracking state
//!   machine; buyram byte counts are derived from the rolling last-known
//!   price because their transfers report no byte amount.
//! - **BatchWriter / EventSink**: batched dual-sink writes (no cross-sink
//!   transaction; replays are deduplicated downstream by global_sequence).
//! - **Grabber / run_cycle**: the resumable polling loop and its per-cycle
//!   step.

pub mod batch;
pub mod chain;
pub mod config;
pub mod cursor;
pub mod event;
pub mod filter;
pub mod grabber;
pub mod influx;
pub mod postgres;
pub mod sink;
pub mod trace;

pub use batch::BatchWriter;
pub use chain::{ChainError, ChainSource, NodeClient};
pub use config::{ConfigError, GrabberConfig, InfluxConfig, PgConfig, RetryConfig};
pub use cursor::Cursor;
pub use event::{ActionKind, RamEvent};
pub use filter::ram_transaction_ids;
pub use grabber::{run_cycle, CycleReport, Grabber};
pub use influx::InfluxSink;
pub use postgres::PgSink;
pub use sink::{EventSink, SinkError};
pub use trace::{process_trace, PriceState, PricedAction, TraceError};
