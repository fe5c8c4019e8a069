use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Connection information for a module as seen on-chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip: String,
    pub port: u16,
}

impl ConnectionInfo {
    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}:{}", self.ip, self.port)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Validator,
    Miner,
}

/// A validator or miner as enumerated through the chain oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub address: Address,
    pub connection: ConnectionInfo,
    /// Stake in base units (pre de-nanofication).
    pub stake: u64,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
}

impl Module {
    pub fn stake_comai(&self) -> f64 {
        self.stake as f64 / crate::constants::NANO_PER_COMAI as f64
    }
}
