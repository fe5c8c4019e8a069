//! The subnet's two HTTP-facing external collaborators: the chain oracle
//! and the miner RPC client.

pub mod error;
pub mod miner;
pub mod oracle;

pub use error::ChainError;
pub use miner::MinerClient;
pub use oracle::{ChainOracle, HttpChainOracle};
