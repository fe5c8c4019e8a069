//! Block ingestor: the receiving side of block propagation. Verifies
//! a peer-broadcast block end-to-end before it ever touches persistence, and
//! prunes the mempool of whatever the block just committed on our behalf.
//!
//! Signature checks are all-or-nothing at the block level: if the proposer
//! signature is good but even one event inside carries a bad validator or
//! user signature, the whole block is rejected rather than applied with
//! that one event dropped. Silently dropping an event would desync the
//! stored block's bytes from what `proposer_signature` actually covers, and
//! would violate the invariant that every applied event's signatures
//! verify. A proposer that ever produces such a block is byzantine from
//! this validator's point of view.

use std::collections::HashSet;
use std::sync::Arc;

use smartdrive_net::Mempool;
use smartdrive_store::Persistence;
use smartdrive_types::constants::MAX_EVENTS_PER_BLOCK;
use smartdrive_types::Block;

use crate::error::NodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Applied as `block_number`.
    Applied(u64),
    /// Older than our tip; already applied (or superseded), so it was
    /// ignored rather than re-applied.
    Stale,
    /// Ahead of our tip; the caller should issue a `SyncRequest` starting at
    /// `expected`.
    Gap { expected: u64 },
    /// Well-ordered but failed signature verification.
    Rejected,
}

pub struct BlockIngestor {
    persistence: Arc<dyn Persistence>,
    mempool: Arc<Mempool>,
}

impl BlockIngestor {
    pub fn new(persistence: Arc<dyn Persistence>, mempool: Arc<Mempool>) -> Self {
        Self { persistence, mempool }
    }

    pub fn ingest(&self, block: Block) -> Result<IngestOutcome, NodeError> {
        let expected = self.persistence.last_block_number() + 1;
        if block.block_number < expected {
            return Ok(IngestOutcome::Stale);
        }
        if block.block_number > expected {
            return Ok(IngestOutcome::Gap { expected });
        }

        if !self.verify(&block)? {
            return Ok(IngestOutcome::Rejected);
        }

        let block_number = block.block_number;
        let uuids: HashSet<String> = block.events.iter().map(|e| e.uuid().to_string()).collect();

        self.persistence.append_block(block)?;
        self.mempool.remove_by_uuids(&uuids);

        Ok(IngestOutcome::Applied(block_number))
    }

    fn verify(&self, block: &Block) -> Result<bool, NodeError> {
        if block.events.len() > MAX_EVENTS_PER_BLOCK {
            return Ok(false);
        }

        let payload = block.sign_payload_bytes()?;
        if !smartdrive_crypto::verify(&payload, &block.proposer_signature, &block.proposer_address) {
            return Ok(false);
        }

        for event in &block.events {
            let params_bytes = event.event_params_bytes()?;
            if !smartdrive_crypto::verify(&params_bytes, event.event_signed_params(), event.validator_address()) {
                return Ok(false);
            }

            if let Some((user_address, input_bytes, input_signature)) = event.user_signed_input()? {
                if !smartdrive_crypto::verify(&input_bytes, input_signature, user_address) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use smartdrive_crypto::{Keypair, Signer};
    use smartdrive_store::MemoryStore;
    use smartdrive_types::{Event, RemoveEvent, RemoveInputParams, RemoveParams};

    fn signed_remove_event(validator: &Keypair, user: &Keypair, file_uuid: &str) -> Event {
        let event_params = RemoveParams { file_uuid: file_uuid.to_string(), miners_processes: vec![] };
        let event_signed_params = smartdrive_crypto::sign_value(validator, &event_params).unwrap();
        let input_params = RemoveInputParams { file_uuid: file_uuid.to_string() };
        let input_signed_params = smartdrive_crypto::sign_value(user, &input_params).unwrap();
        Event::Remove(RemoveEvent {
            uuid: format!("1_{file_uuid}"),
            validator_address: validator.address().clone(),
            event_params,
            event_signed_params,
            user_address: user.address().clone(),
            input_params,
            input_signed_params,
        })
    }

    fn sealed_block(validator: &Keypair, block_number: u64, events: Vec<Event>) -> Block {
        let payload = smartdrive_types::BlockSignPayload { block_number, events: &events };
        let bytes = smartdrive_types::canonical_json::canonical_bytes(&payload).unwrap();
        let proposer_signature = validator.sign_bytes(&bytes).unwrap();
        Block { block_number, events, proposer_signature, proposer_address: validator.address().clone() }
    }

    fn ingestor() -> (BlockIngestor, Arc<dyn Persistence>, Arc<Mempool>) {
        let persistence: Arc<dyn Persistence> = Arc::new(MemoryStore::new());
        let mempool = Arc::new(Mempool::new());
        let ingestor = BlockIngestor::new(persistence.clone(), mempool.clone());
        (ingestor, persistence, mempool)
    }

    #[test]
    fn detects_gap_ahead_of_tip() {
        let (ingestor, _persistence, _mempool) = ingestor();
        let validator = Keypair::generate();
        let block = sealed_block(&validator, 5, vec![]);
        let outcome = ingestor.ingest(block).unwrap();
        assert_eq!(outcome, IngestOutcome::Gap { expected: 1 });
    }

    #[test]
    fn ignores_stale_block_behind_tip() {
        let (ingestor, persistence, _mempool) = ingestor();
        let validator = Keypair::generate();
        persistence.append_block(sealed_block(&validator, 1, vec![])).unwrap();
        let outcome = ingestor.ingest(sealed_block(&validator, 1, vec![])).unwrap();
        assert_eq!(outcome, IngestOutcome::Stale);
    }

    #[test]
    fn rejects_block_with_bad_proposer_signature() {
        let (ingestor, _persistence, _mempool) = ingestor();
        let validator = Keypair::generate();
        let mut block = sealed_block(&validator, 1, vec![]);
        block.proposer_signature = "00".repeat(64);
        let outcome = ingestor.ingest(block).unwrap();
        assert_eq!(outcome, IngestOutcome::Rejected);
    }

    #[test]
    fn rejects_block_with_bad_event_user_signature() {
        let (ingestor, _persistence, _mempool) = ingestor();
        let validator = Keypair::generate();
        let user = Keypair::generate();
        let mut event = signed_remove_event(&validator, &user, "f1");
        if let Event::Remove(ref mut e) = event {
            e.input_signed_params = "00".repeat(64);
        }
        let block = sealed_block(&validator, 1, vec![event]);
        let outcome = ingestor.ingest(block).unwrap();
        assert_eq!(outcome, IngestOutcome::Rejected);
    }

    #[test]
    fn applies_valid_block_and_prunes_mempool() {
        let (ingestor, persistence, mempool) = ingestor();
        let validator = Keypair::generate();
        let user = Keypair::generate();
        let event = signed_remove_event(&validator, &user, "f1");
        mempool.add(event.clone());
        assert_eq!(mempool.len(), 1);

        let block = sealed_block(&validator, 1, vec![event]);
        let outcome = ingestor.ingest(block).unwrap();
        assert_eq!(outcome, IngestOutcome::Applied(1));
        assert_eq!(persistence.last_block_number(), 1);
        assert!(mempool.is_empty());
    }
}
