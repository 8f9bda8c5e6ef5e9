//! Batch accumulation and the dual-sink flush.

use crate::event::RamEvent;
use crate::sink::{EventSink, SinkError};

/// Accumulates priced events and flushes them to every sink as one batch.
///
/// The sinks are written independently, in order; there is no cross-sink
/// transaction. When a later sink fails after an earlier one succeeded the
/// sinks diverge until the range is replayed.
pub struct BatchWriter {
    pending: Vec<RamEvent>,
    batch_blocks: u64,
}

impl BatchWriter {
    pub fn new(batch_blocks: u64) -> Self {
        Self {
            pending: Vec::new(),
            batch_blocks,
        }
    }

    pub fn push(&mut self, event: RamEvent) {
        self.pending.push(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Full-batch flush points sit on block heights divisible by the batch
    /// size, not on counts of processed blocks.
    pub fn is_flush_block(&self, block_num: u64) -> bool {
        self.batch_blocks > 0 && block_num % self.batch_blocks == 0
    }

    /// Write the accumulated batch to every sink, clearing it only once all
    /// sinks accepted it. Returns the number of events written.
    pub async fn flush(&mut self, sinks: &mut [Box<dyn EventSink>]) -> Result<usize, SinkError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        for sink in sinks.iter_mut() {
            sink.write_batch(&self.pending).await?;
            tracing::debug!(sink = sink.name(), events = self.pending.len(), "batch written");
        }
        let written = self.pending.len();
        self.pending.clear();
        Ok(written)
    }
}
