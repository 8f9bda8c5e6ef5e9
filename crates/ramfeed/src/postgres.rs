//! Relational sink: COPY-based bulk load into the `ram` table, plus the
//! startup seed query (highest persisted block and its prices).

use crate::config::PgConfig;
use crate::event::RamEvent;
use crate::sink::{EventSink, SinkError};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{pin_mut, SinkExt};
use std::fmt::Write as _;
use tokio_postgres::{Client, NoTls};

const COPY_STMT: &str = "COPY ram (action, receiver, payer, time, ramprice_inc_fee, \
     tokens, ramprice, bytes, fee, trx, block_num, global_sequence) FROM STDIN";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS ram (
    action text NOT NULL,
    receiver text NOT NULL,
    payer text NOT NULL,
    time timestamptz NOT NULL,
    ramprice_inc_fee double precision NOT NULL,
    tokens double precision NOT NULL,
    ramprice double precision NOT NULL,
    bytes double precision NOT NULL,
    fee double precision NOT NULL,
    trx text NOT NULL,
    block_num bigint NOT NULL,
    global_sequence bigint NOT NULL
)";

const SEED_QUERY: &str = "select block_num, ramprice, ramprice_inc_fee from ram \
     order by block_num desc limit 1";

/// Encode a batch as tab-separated COPY text rows, in COPY column order.
pub fn copy_rows(events: &[RamEvent]) -> String {
    let mut rows = String::new();
    for event in events {
        let _ = writeln!(
            rows,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            event.action.as_str(),
            event.receiver,
            event.payer,
            event.time.format("%Y-%m-%d %H:%M:%S%.f+00"),
            event.ram_price_inc_fee,
            event.tokens,
            event.ram_price,
            event.bytes,
            event.fee,
            event.trx,
            event.block_num,
            event.global_sequence,
        );
    }
    rows
}

/// Relational sink. One client, no pool: the grabber is a single sequential
/// writer.
pub struct PgSink {
    client: Client,
}

impl PgSink {
    /// Connect and make sure the `ram` table exists. The connection task is
    /// spawned onto the current runtime. TLS is left to the deployment.
    pub async fn connect(config: &PgConfig) -> Result<Self, SinkError> {
        let params = format!(
            "host={} dbname={} user={} password={}",
            config.host, config.dbname, config.user, config.password
        );
        let (client, connection) = tokio_postgres::connect(&params, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(reason = %e, "postgres connection closed");
            }
        });
        client.execute(CREATE_TABLE, &[]).await?;
        Ok(Self { client })
    }

    /// Highest persisted block and the prices recorded with it; None on a
    /// fresh table.
    pub async fn last_block_and_price(&self) -> Result<Option<(u64, f64, f64)>, SinkError> {
        let row = self.client.query_opt(SEED_QUERY, &[]).await?;
        Ok(row.map(|row| {
            let block_num: i64 = row.get(0);
            let ram_price: f64 = row.get(1);
            let ram_price_inc_fee: f64 = row.get(2);
            (block_num as u64, ram_price, ram_price_inc_fee)
        }))
    }
}

#[async_trait]
impl EventSink for PgSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn write_batch(&mut self, events: &[RamEvent]) -> Result<(), SinkError> {
        let rows = copy_rows(events);
        let transaction = self.client.transaction().await?;
        let sink = transaction.copy_in(COPY_STMT).await?;
        pin_mut!(sink);
        sink.send(Bytes::from(rows)).await?;
        sink.finish().await?;
        transaction.commit().await?;
        Ok(())
    }
}
