//! The polling loop: one sequential worker driving fetch → filter → price →
//! batch → sinks, with a durable watermark.

use crate::batch::BatchWriter;
use crate::chain::{ChainSource, NodeClient};
use crate::config::{GrabberConfig, RetryConfig};
use crate::cursor::Cursor;
use crate::event::parse_block_time;
use crate::filter::ram_transaction_ids;
use crate::influx::InfluxSink;
use crate::postgres::PgSink;
use crate::sink::EventSink;
use crate::trace::{process_trace, PriceState};
use anyhow::{Context, Result};
use rand::Rng;
use serde_json::Value;
use std::time::Instant;
use tokio::time::{sleep, Duration};

/// Summary of one completed polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Head height observed at the start of the cycle (the new watermark).
    pub head: u64,
    pub blocks: u64,
    pub events: u64,
    pub flushes: u64,
}

/// Process every trace of one transaction in listed order. Malformed traces
/// are skipped with a warning; they contribute no event and leave the price
/// state untouched. Returns the number of events batched.
fn process_transaction(tx: &Value, price: &mut PriceState, batch: &mut BatchWriter) -> Result<u64> {
    let block_num = tx
        .get("block_num")
        .and_then(|n| n.as_u64())
        .context("transaction missing block_num")?;
    let trx_id = tx
        .get("id")
        .and_then(|i| i.as_str())
        .context("transaction missing id")?;
    let time = tx
        .get("block_time")
        .and_then(|t| t.as_str())
        .context("transaction missing block_time")?;
    let time = parse_block_time(time)?;
    let traces = match tx.get("traces").and_then(|t| t.as_array()) {
        Some(traces) => traces,
        None => return Ok(0),
    };
    let mut emitted = 0;
    for trace in traces {
        match process_trace(trace, price) {
            Ok(Some(action)) => {
                batch.push(action.into_event(block_num, trx_id.to_string(), time));
                emitted += 1;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(trx = trx_id, reason = %e, "skipping trace"),
        }
    }
    Ok(emitted)
}

/// Process `[cursor.next_block(), head]` once: fetch, filter, price, batch,
/// flush, then advance the cursor to the head observed at entry.
///
/// Blocks are processed in increasing height order, transactions and traces
/// in listed order; buyram pricing depends on exactly this order. On error
/// the cursor is left untouched and the accumulated batch is dropped with
/// this call; the next cycle rebuilds it from the same range.
pub async fn run_cycle<S: ChainSource>(
    source: &S,
    sinks: &mut [Box<dyn EventSink>],
    cursor: &mut Cursor,
    price: &mut PriceState,
    batch_blocks: u64,
) -> Result<CycleReport> {
    let head = source.head_block_num().await.context("fetch head height")?;
    let mut batch = BatchWriter::new(batch_blocks);
    let mut report = CycleReport {
        head,
        ..Default::default()
    };

    for block_num in cursor.next_block()..=head {
        let block = source
            .get_block(block_num)
            .await
            .with_context(|| format!("fetch block {block_num}"))?;
        for id in ram_transaction_ids(&block) {
            let tx = source
                .get_transaction(&id)
                .await
                .with_context(|| format!("fetch transaction {id}"))?;
            report.events += process_transaction(&tx, price, &mut batch)?;
        }
        report.blocks += 1;
        if batch.is_flush_block(block_num) && !batch.is_empty() {
            batch.flush(sinks).await.context("flush batch")?;
            report.flushes += 1;
        }
    }
    if !batch.is_empty() {
        batch.flush(sinks).await.context("flush residual batch")?;
        report.flushes += 1;
    }
    cursor.advance_to(head);
    Ok(report)
}

/// Exponential backoff capped at the configured max, plus up to 500 ms of
/// jitter.
fn backoff(retry: &RetryConfig, failures: u32) -> Duration {
    let secs = retry
        .initial_backoff_secs
        .saturating_mul(1u64 << failures.min(16))
        .min(retry.max_backoff_secs);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
    Duration::from_secs(secs) + jitter
}

/// The grabber service: seeds cursor and price state from the relational
/// sink, then polls forever. No termination besides external shutdown.
pub struct Grabber {
    config: GrabberConfig,
}

impl Grabber {
    pub fn new(config: GrabberConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config;
        let node = NodeClient::new(&config.node_url).context("build node client")?;
        let influx =
            InfluxSink::new(&config.influx.url, &config.influx.database).context("build influx sink")?;
        let pg = PgSink::connect(&config.pg).await.context("connect postgres")?;

        let (mut cursor, mut price) = match pg
            .last_block_and_price()
            .await
            .context("seed from relational sink")?
        {
            Some((block, ram_price, ram_price_inc_fee)) => {
                tracing::info!(block, ram_price, "resuming from last persisted block");
                (
                    Cursor::new(block),
                    PriceState {
                        ram_price,
                        ram_price_inc_fee,
                    },
                )
            }
            None => {
                tracing::info!(start_block = config.start_block, "no persisted rows, starting fresh");
                (
                    Cursor::new(config.start_block.saturating_sub(1)),
                    PriceState::default(),
                )
            }
        };

        // Time-series first, relational second: the relational sink is the
        // resume source, so a persisted row implies the point was already
        // sent to the time-series sink.
        let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(influx), Box::new(pg)];

        let mut failures: u32 = 0;
        loop {
            let started = Instant::now();
            match run_cycle(&node, &mut sinks, &mut cursor, &mut price, config.batch_blocks).await {
                Ok(report) => {
                    failures = 0;
                    tracing::info!(
                        blocks = report.blocks,
                        events = report.events,
                        elapsed_secs = started.elapsed().as_secs_f64(),
                        last_block = report.head,
                        "cycle complete"
                    );
                    sleep(Duration::from_secs(config.poll_interval_secs)).await;
                }
                Err(e) => {
                    tracing::warn!(reason = %e, failures, "cycle failed, backing off");
                    sleep(backoff(&config.retry, failures)).await;
                    failures = failures.saturating_add(1);
                }
            }
        }
    }
}
