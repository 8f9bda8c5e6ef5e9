//! Grabber configuration.

use std::env;
use thiserror::Error;

/// Grabber configuration.
#[derive(Debug, Clone)]
pub struct GrabberConfig {
    /// Node base URL (get_info / get_block / get_transaction).
    pub node_url: String,
    /// Time-series sink.
    pub influx: InfluxConfig,
    /// Relational sink; also the resume source for cursor and price state.
    pub pg: PgConfig,
    /// First block to process when the relational sink is empty.
    pub start_block: u64,
    /// Sleep between polling cycles.
    pub poll_interval_secs: u64,
    /// Full-batch flush on block heights divisible by this.
    pub batch_blocks: u64,
    /// Backoff after a failed cycle.
    pub retry: RetryConfig,
}

/// Time-series sink connection.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub database: String,
}

/// Relational sink connection parameters.
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

/// Retry backoff (initial and max seconds).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 1,
            max_backoff_secs: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVariable(&'static str),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVariable(name))
}

fn optional_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

impl GrabberConfig {
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_BATCH_BLOCKS: u64 = 100;

    /// Read configuration from the environment. The four PG_EOS_* variables
    /// are the relational sink's connection parameters; provisioning them is
    /// the deployment's concern.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            node_url: required("EOS_NODE_URL")?,
            influx: InfluxConfig {
                url: required("INFLUX_URL")?,
                database: required("INFLUX_DB")?,
            },
            pg: PgConfig {
                host: required("PG_EOS_HOST")?,
                dbname: required("PG_EOS_DBNAME")?,
                user: required("PG_EOS_USER")?,
                password: required("PG_EOS_PASSWORD")?,
            },
            start_block: optional_u64("START_BLOCK", 1)?,
            poll_interval_secs: optional_u64(
                "POLL_INTERVAL_SECS",
                Self::DEFAULT_POLL_INTERVAL_SECS,
            )?,
            batch_blocks: Self::DEFAULT_BATCH_BLOCKS,
            retry: RetryConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_default() {
        let c = RetryConfig::default();
        assert_eq!(c.initial_backoff_secs, 1);
        assert_eq!(c.max_backoff_secs, 60);
    }

    #[test]
    fn batch_defaults() {
        assert_eq!(GrabberConfig::DEFAULT_BATCH_BLOCKS, 100);
        assert_eq!(GrabberConfig::DEFAULT_POLL_INTERVAL_SECS, 10);
    }
}
