//! Write targets for the priced event stream.

use crate::event::RamEvent;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP write failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// One write target for event batches.
///
/// Writes must tolerate replay: a cycle that fails after a partial flush is
/// reprocessed from the watermark, so the same events can arrive again.
/// Duplicates are deduplicated downstream by global_sequence.
#[async_trait]
pub trait EventSink: Send {
    /// Sink name for logs.
    fn name(&self) -> &'static str;

    /// Durably write one batch; either all events land or the call fails.
    async fn write_batch(&mut self, events: &[RamEvent]) -> Result<(), SinkError>;
}
