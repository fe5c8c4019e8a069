//! The chain oracle client: enumerates validators/miners, looks up
//! stake-to-weight totals, and submits weights. An externally-hosted
//! collaborator this crate only reaches over HTTP — we still give it a
//! trait so `smartdrive-node` can be exercised against a fake in tests,
//! the same way the persistence layer is behind `Persistence`.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use smartdrive_types::{Address, Module, ModuleType};

use crate::error::ChainError;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Read/write access to the on-chain module registry. `netuid` scopes every
/// call to one subnet.
#[async_trait::async_trait]
pub trait ChainOracle: Send + Sync {
    async fn get_modules(&self, netuid: u16, module_type: ModuleType) -> Result<Vec<Module>, ChainError>;
    async fn get_stake_to(&self, address: &Address, netuid: u16) -> Result<HashMap<Address, u64>, ChainError>;
    async fn set_weights(&self, scores: HashMap<Address, u64>, netuid: u16) -> Result<(), ChainError>;
}

/// Reaches the chain node over its JSON HTTP RPC endpoint.
pub struct HttpChainOracle {
    client: reqwest::Client,
    node_url: String,
}

impl HttpChainOracle {
    pub fn new(node_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(smartdrive_types::constants::DEFAULT_RPC_TIMEOUT_SECONDS))
                .build()
                .expect("reqwest client builds with static config"),
            node_url: node_url.into(),
        }
    }

    async fn get_with_retry<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ChainError> {
        let url = format!("{}{path}", self.node_url);
        let mut last_err = None;
        for attempt in 0..RETRY_ATTEMPTS {
            match self.client.get(&url).query(query).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => return Ok(resp.json::<T>().await.map_err(|e| ChainError::NetworkUnreachable { attempts: attempt + 1, source: e })?),
                    Err(e) => last_err = Some(e),
                },
                Err(e) => last_err = Some(e),
            }
            if attempt + 1 < RETRY_ATTEMPTS {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
        }
        Err(ChainError::NetworkUnreachable {
            attempts: RETRY_ATTEMPTS,
            source: last_err.expect("loop always records an error before exhausting attempts"),
        })
    }
}

#[async_trait::async_trait]
impl ChainOracle for HttpChainOracle {
    async fn get_modules(&self, netuid: u16, module_type: ModuleType) -> Result<Vec<Module>, ChainError> {
        let type_param = match module_type {
            ModuleType::Validator => "validator",
            ModuleType::Miner => "miner",
        };
        self.get_with_retry(
            "/modules",
            &[("netuid", netuid.to_string()), ("type", type_param.to_string())],
        )
        .await
    }

    async fn get_stake_to(&self, address: &Address, netuid: u16) -> Result<HashMap<Address, u64>, ChainError> {
        self.get_with_retry(
            "/stake_to",
            &[("address", address.to_string()), ("netuid", netuid.to_string())],
        )
        .await
    }

    async fn set_weights(&self, scores: HashMap<Address, u64>, netuid: u16) -> Result<(), ChainError> {
        let url = format!("{}/set_weights", self.node_url);
        let mut last_err = None;
        for attempt in 0..RETRY_ATTEMPTS {
            let body = serde_json::json!({ "netuid": netuid, "weights": scores });
            match self.client.post(&url).json(&body).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(_) => return Ok(()),
                    Err(e) => last_err = Some(e),
                },
                Err(e) => last_err = Some(e),
            }
            if attempt + 1 < RETRY_ATTEMPTS {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
        }
        Err(ChainError::NetworkUnreachable {
            attempts: RETRY_ATTEMPTS,
            source: last_err.expect("loop always records an error before exhausting attempts"),
        })
    }
}
