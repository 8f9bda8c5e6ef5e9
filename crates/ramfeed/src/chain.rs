//! Node access: head height, block by height, transaction by id.
//!
//! Three POST endpoints, one round trip each. Payloads stay as JSON values;
//! callers traverse the fields they need.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

pub const INFO_PATH: &str = "/v1/chain/get_info";
pub const BLOCK_PATH: &str = "/v1/chain/get_block";
pub const TRANSACTION_PATH: &str = "/v1/history/get_transaction";

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("node error: {0}")]
    Api(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The narrow fetch interface the poll loop runs against. Implemented by
/// [NodeClient] and by in-memory chains in tests.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn head_block_num(&self) -> Result<u64, ChainError>;
    async fn get_block(&self, block_num: u64) -> Result<Value, ChainError>;
    async fn get_transaction(&self, id: &str) -> Result<Value, ChainError>;
}

/// HTTP client for one node.
pub struct NodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ChainError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(&body).send().await?;
        let resp = resp.error_for_status()?;
        let v: Value = resp.json().await?;
        if let Some(err) = v.get("error") {
            return Err(ChainError::Api(err.to_string()));
        }
        Ok(v)
    }
}

#[async_trait]
impl ChainSource for NodeClient {
    async fn head_block_num(&self) -> Result<u64, ChainError> {
        let info = self.post_json(INFO_PATH, json!({})).await?;
        info.get("head_block_num")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| ChainError::Decode("get_info missing head_block_num".into()))
    }

    async fn get_block(&self, block_num: u64) -> Result<Value, ChainError> {
        self.post_json(BLOCK_PATH, json!({ "block_num_or_id": block_num }))
            .await
    }

    async fn get_transaction(&self, id: &str) -> Result<Value, ChainError> {
        self.post_json(TRANSACTION_PATH, json!({ "id": id })).await
    }
}
