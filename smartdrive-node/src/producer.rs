//! Block producer: decides the proposer, assembles/signs/broadcasts
//! blocks on the `BLOCK_INTERVAL_SECONDS` cadence. One call to
//! `try_produce_round` is one tick of that loop; the binary drives the
//! wall-clock timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smartdrive_crypto::{Keypair, Signer};
use smartdrive_net::{ConnectionPool, Mempool};
use smartdrive_store::Persistence;
use smartdrive_types::constants::MAX_EVENTS_PER_BLOCK;
use smartdrive_types::{Address, Block, PeerMessage};

use crate::error::NodeError;
use crate::proposer::{elect_proposer, Candidate};

pub struct BlockProducer {
    persistence: Arc<dyn Persistence>,
    mempool: Arc<Mempool>,
    pool: Arc<ConnectionPool>,
    /// Set once this validator has requested an initial sync as a freshly
    /// elected proposer; the round that sets it produces no block.
    synced: AtomicBool,
}

impl BlockProducer {
    pub fn new(persistence: Arc<dyn Persistence>, mempool: Arc<Mempool>, pool: Arc<ConnectionPool>) -> Self {
        Self { persistence, mempool, pool, synced: AtomicBool::new(false) }
    }

    /// Runs one round: elects the proposer from `active` (the active
    /// validator set plus self, with stakes), and if this validator wins,
    /// drains the mempool and seals a block. Returns `None` when this
    /// validator is not the proposer, or when the round was consumed by an
    /// initial sync request.
    pub async fn try_produce_round(&self, self_stake: u64, active: &[Candidate], validator_key: &Keypair) -> Result<Option<Block>, NodeError> {
        let mut candidates: Vec<Candidate> = active
            .iter()
            .map(|c| Candidate { address: c.address.clone(), stake: c.stake })
            .collect();
        candidates.push(Candidate { address: validator_key.address().clone(), stake: self_stake });

        let proposer = elect_proposer(&candidates);
        if &proposer != validator_key.address() {
            return Ok(None);
        }

        if !self.synced.swap(true, Ordering::SeqCst) {
            let peers = self.pool.snapshot();
            if !peers.is_empty() {
                let start = self.persistence.last_block_number() + 1;
                if let Ok(frame) = smartdrive_net::encode_frame(validator_key, PeerMessage::SyncRequest { start, end: None }) {
                    if let Some(peer) = peers.first() {
                        peer.send(frame);
                    }
                }
                return Ok(None);
            }
        }

        let events = self.mempool.drain(MAX_EVENTS_PER_BLOCK);
        let block_number = self.persistence.last_block_number() + 1;
        let proposer_address = validator_key.address().clone();

        let sign_payload = smartdrive_types::BlockSignPayload { block_number, events: &events };
        let bytes = smartdrive_types::canonical_json::canonical_bytes(&sign_payload)?;
        let proposer_signature = validator_key.sign_bytes(&bytes)?;

        let block = Block { block_number, events, proposer_signature, proposer_address };
        if let Err(err) = self.persistence.append_block(block.clone()) {
            self.mempool.requeue(block.events);
            return Err(err.into());
        }

        if let Ok(frame) = smartdrive_net::encode_frame(validator_key, PeerMessage::block_from(&block)) {
            self.pool.broadcast(&frame);
        }

        Ok(Some(block))
    }

    pub fn active_validators_excluding(&self, self_address: &Address) -> Vec<Address> {
        self.pool.active_validators(self_address)
    }
}
