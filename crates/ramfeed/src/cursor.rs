//! Durable-write watermark for the grabber.
//!
//! Seeded from the relational sink at startup; restarts resume from the
//! block after the highest durably persisted one.

/// Cursor: highest block whose events are confirmed written to both sinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    pub last_processed_block: u64,
}

impl Cursor {
    pub fn new(last_processed_block: u64) -> Self {
        Self {
            last_processed_block,
        }
    }

    /// First block of the next cycle's range.
    pub fn next_block(&self) -> u64 {
        self.last_processed_block + 1
    }

    /// Advance to `head`; never moves backward.
    pub fn advance_to(&mut self, head: u64) {
        if head > self.last_processed_block {
            self.last_processed_block = head;
        }
    }
}
