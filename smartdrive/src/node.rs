//! Wires every engine crate together into one running validator: loads the
//! key, opens persistence, builds the chain and miner clients, and starts
//! every long-lived engine on top of a single `Config`.

use std::sync::Arc;

use smartdrive_chain::{ChainOracle, HttpChainOracle, MinerClient};
use smartdrive_crypto::Keypair;
use smartdrive_net::{ConnectionPool, Mempool};
use smartdrive_node::{BlockIngestor, BlockProducer, PlacementEngine, ValidationEngine};
use smartdrive_store::{Persistence, SledStore};

use crate::config::Config;

pub struct Node {
    pub config: Config,
    pub validator_key: Keypair,
    pub persistence: Arc<dyn Persistence>,
    pub oracle: Arc<dyn ChainOracle>,
    pub miner_client: Arc<MinerClient>,
    pub pool: Arc<ConnectionPool>,
    pub mempool: Arc<Mempool>,
    pub placement: Arc<PlacementEngine>,
    pub validation: Arc<ValidationEngine>,
    pub producer: Arc<BlockProducer>,
    pub ingestor: Arc<BlockIngestor>,
}

impl Node {
    pub fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let secret_hex = std::fs::read_to_string(&config.key_path)?.trim().to_string();
        let validator_key = Keypair::from_secret_hex(&secret_hex)?;
        tracing::info!(address = %validator_key.address(), "loaded validator key");

        let persistence: Arc<dyn Persistence> = Arc::new(SledStore::open(&config.database_path)?);
        let oracle: Arc<dyn ChainOracle> = Arc::new(HttpChainOracle::new(config.chain_node_url.clone()));
        let miner_client = Arc::new(MinerClient::default());
        let pool = Arc::new(ConnectionPool::new());
        let mempool = Arc::new(Mempool::new());

        let placement = Arc::new(PlacementEngine::new(miner_client.clone()));
        let validation = Arc::new(ValidationEngine::new(
            persistence.clone(),
            oracle.clone(),
            miner_client.clone(),
            placement.clone(),
        ));
        let producer = Arc::new(BlockProducer::new(persistence.clone(), mempool.clone(), pool.clone()));
        let ingestor = Arc::new(BlockIngestor::new(persistence.clone(), mempool.clone()));

        Ok(Self {
            config,
            validator_key,
            persistence,
            oracle,
            miner_client,
            pool,
            mempool,
            placement,
            validation,
            producer,
            ingestor,
        })
    }
}
