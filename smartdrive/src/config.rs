//! CLI flags (`CliOpts`) and the `Config` derived from them.

use std::path::PathBuf;

use clap::Parser;
use smartdrive_types::constants::DEFAULT_PORT;

/// Mainnet/testnet netuid split: `--testnet` only ever changes which
/// subnet the validator queries.
const MAINNET_NETUID: u16 = 32;
const TESTNET_NETUID: u16 = 116;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), author = env!("CARGO_PKG_AUTHORS"), version, about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct CliOpts {
    /// Path to the hex-encoded ed25519 secret key this validator signs with.
    #[arg(long)]
    pub key: PathBuf,

    /// Directory for the sled-backed persistence store.
    #[arg(long, default_value = "smartdrive-db")]
    pub database_path: PathBuf,

    /// Port the public API listens on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Run against the testnet subnet instead of mainnet.
    #[arg(long)]
    pub testnet: bool,

    /// Base URL of the chain node's JSON HTTP RPC, an externally
    /// addressed collaborator this binary needs to be told how to reach.
    #[arg(long)]
    pub chain_node_url: String,

    /// TCP port the peer transport listens on for inbound connections.
    #[arg(long, default_value_t = 9001)]
    pub peer_port: u16,
}

/// The fully-resolved configuration a [`crate::node::Node`] bootstraps from.
#[derive(Debug, Clone)]
pub struct Config {
    pub key_path: PathBuf,
    pub database_path: PathBuf,
    pub port: u16,
    pub peer_port: u16,
    pub chain_node_url: String,
    pub netuid: u16,
}

impl From<CliOpts> for Config {
    fn from(opts: CliOpts) -> Self {
        let netuid = if opts.testnet { TESTNET_NETUID } else { MAINNET_NETUID };
        Config {
            key_path: opts.key,
            database_path: opts.database_path,
            port: opts.port,
            peer_port: opts.peer_port,
            chain_node_url: opts.chain_node_url,
            netuid,
        }
    }
}
