//! Time-series sink: line-protocol encoding and the InfluxDB 1.x write
//! endpoint.

use crate::event::RamEvent;
use crate::sink::{EventSink, SinkError};
use async_trait::async_trait;
use std::fmt::Write as _;

/// Encode one batch as line protocol, one line per event: measurement `ram`,
/// tags action/payer/receiver, nanosecond timestamps.
///
/// Account names are drawn from [.1-5a-z], so tag values need no escaping.
pub fn line_protocol(events: &[RamEvent]) -> String {
    let mut lines = String::new();
    for event in events {
        let nanos = event.time.timestamp_nanos_opt().unwrap_or(0);
        let _ = writeln!(
            lines,
            "ram,action={},payer={},receiver={} block_num={}i,bytes={},fee={},global_sequence={}i,ramprice={},ramprice_inc_fee={},tokens={},trx=\"{}\" {}",
            event.action.as_str(),
            event.payer,
            event.receiver,
            event.block_num,
            event.bytes,
            event.fee,
            event.global_sequence,
            event.ram_price,
            event.ram_price_inc_fee,
            event.tokens,
            event.trx,
            nanos,
        );
    }
    lines
}

/// Sink writing to an InfluxDB 1.x `/write` endpoint.
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
}

impl InfluxSink {
    pub fn new(url: &str, database: &str) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            write_url: format!("{}/write?db={}", url, database),
        })
    }
}

#[async_trait]
impl EventSink for InfluxSink {
    fn name(&self) -> &'static str {
        "influx"
    }

    async fn write_batch(&mut self, events: &[RamEvent]) -> Result<(), SinkError> {
        let body = line_protocol(events);
        let resp = self.client.post(&self.write_url).body(body).send().await?;
        resp.error_for_status()?;
        Ok(())
    }
}
