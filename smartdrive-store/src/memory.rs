use std::collections::HashMap;

use parking_lot::Mutex;
use smartdrive_types::constants::VALIDATION_VOTE_INTERVAL_SECONDS;
use smartdrive_types::{Address, Block, ChunkRecord, FileRecord, ValidateEvent};

use crate::apply::effects_for;
use crate::error::StoreError;
use crate::model::PendingValidation;
use crate::traits::Persistence;

#[derive(Default)]
struct State {
    blocks: Vec<Block>,
    chunks: HashMap<String, ChunkRecord>,
    chunks_by_file: HashMap<String, Vec<String>>,
    files: HashMap<String, FileRecord>,
    pending: Vec<PendingValidation>,
    next_pending_id: u64,
}

/// An in-memory `Persistence`, for tests and single-process demos. A
/// `parking_lot::Mutex`-guarded set of `HashMap`s, one per entity.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    fn schedule_pending(state: &mut State, chunk_uuid: &str, now_ms: i64) {
        let Some(chunk) = state.chunks.get(chunk_uuid) else {
            tracing::warn!(chunk_uuid, "validation event referenced unknown chunk, skipping schedule");
            return;
        };
        let id = state.next_pending_id;
        state.next_pending_id += 1;
        state.pending.push(PendingValidation {
            id,
            file_uuid: chunk.file_uuid.clone(),
            chunk_uuid: chunk.chunk_uuid.clone(),
            miner_address: chunk.miner_address.clone(),
            sub_chunk_start: chunk.sub_chunk_start,
            sub_chunk_end: chunk.sub_chunk_end,
            sub_chunk_encoded: chunk.sub_chunk_encoded.clone(),
            next_due_at_ms: now_ms + (VALIDATION_VOTE_INTERVAL_SECONDS as i64) * 1000,
        });
    }
}

impl Persistence for MemoryStore {
    fn append_block(&self, block: Block) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let expected = state.blocks.len() as u64 + 1;
        if block.block_number != expected {
            return Err(StoreError::BlockNumberMismatch { expected, got: block.block_number });
        }
        let now_ms = chrono::Utc::now().timestamp_millis();
        for event in &block.events {
            let effects = effects_for(event, now_ms);
            for record in effects.chunk_records {
                state
                    .chunks_by_file
                    .entry(record.file_uuid.clone())
                    .or_default()
                    .push(record.chunk_uuid.clone());
                state.chunks.insert(record.chunk_uuid.clone(), record);
            }
            if let Some(file) = effects.file_insert {
                state.files.insert(file.file_uuid.clone(), file);
            }
            if let Some(file_uuid) = effects.file_delete {
                state.files.remove(&file_uuid);
                if let Some(chunk_uuids) = state.chunks_by_file.remove(&file_uuid) {
                    for chunk_uuid in chunk_uuids {
                        state.chunks.remove(&chunk_uuid);
                    }
                }
            }
            for chunk_uuid in effects.schedule_validation_for {
                Self::schedule_pending(&mut state, &chunk_uuid, now_ms);
            }
        }
        state.blocks.push(block);
        Ok(())
    }

    fn last_block_number(&self) -> u64 {
        self.state.lock().blocks.len() as u64
    }

    fn get_block(&self, number: u64) -> Result<Option<Block>, StoreError> {
        if number == 0 {
            return Ok(None);
        }
        Ok(self.state.lock().blocks.get((number - 1) as usize).cloned())
    }

    fn iter_blocks(&self, from: u64, to: u64) -> Result<Vec<Block>, StoreError> {
        let state = self.state.lock();
        let from = from.max(1);
        Ok((from..=to)
            .filter_map(|n| state.blocks.get((n - 1) as usize).cloned())
            .collect())
    }

    fn insert_chunk_records(&self, records: Vec<ChunkRecord>) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        for record in records {
            state
                .chunks_by_file
                .entry(record.file_uuid.clone())
                .or_default()
                .push(record.chunk_uuid.clone());
            state.chunks.insert(record.chunk_uuid.clone(), record);
        }
        Ok(())
    }

    fn delete_file(&self, file_uuid: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.files.remove(file_uuid);
        if let Some(chunk_uuids) = state.chunks_by_file.remove(file_uuid) {
            for chunk_uuid in chunk_uuids {
                state.chunks.remove(&chunk_uuid);
            }
        }
        Ok(())
    }

    fn list_files_owned_by(&self, owner: &Address) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .files
            .values()
            .filter(|f| &f.owner_address == owner)
            .cloned()
            .collect())
    }

    fn get_chunks_for_file(&self, file_uuid: &str) -> Result<Vec<ChunkRecord>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .chunks_by_file
            .get(file_uuid)
            .map(|uuids| uuids.iter().filter_map(|u| state.chunks.get(u).cloned()).collect())
            .unwrap_or_default())
    }

    fn get_chunk(&self, chunk_uuid: &str) -> Result<Option<ChunkRecord>, StoreError> {
        Ok(self.state.lock().chunks.get(chunk_uuid).cloned())
    }

    fn get_chunks_for_miner(&self, miner_address: &Address) -> Result<Vec<ChunkRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .chunks
            .values()
            .filter(|c| &c.miner_address == miner_address)
            .cloned()
            .collect())
    }

    fn insert_validation_events(&self, events: &[ValidateEvent]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        let now_ms = chrono::Utc::now().timestamp_millis();
        for event in events {
            for chunk_uuid in event
                .event_params
                .miners_processes
                .iter()
                .filter(|p| p.succeed)
                .filter_map(|p| p.chunk_uuid.clone())
            {
                Self::schedule_pending(&mut state, &chunk_uuid, now_ms);
            }
        }
        Ok(())
    }

    fn pop_due_validations(&self, now_ms: i64, limit: usize) -> Result<Vec<PendingValidation>, StoreError> {
        let mut state = self.state.lock();
        let mut due_indices: Vec<usize> = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.next_due_at_ms <= now_ms)
            .map(|(i, _)| i)
            .take(limit)
            .collect();
        due_indices.sort_unstable_by(|a, b| b.cmp(a));
        let mut out = Vec::with_capacity(due_indices.len());
        for idx in due_indices {
            out.push(state.pending.remove(idx));
        }
        out.reverse();
        Ok(out)
    }

    fn expired_files(&self, now_ms: i64) -> Result<Vec<String>, StoreError> {
        Ok(self
            .state
            .lock()
            .files
            .values()
            .filter(|f| f.is_expired(now_ms))
            .map(|f| f.file_uuid.clone())
            .collect())
    }

    fn insert_file_record(&self, record: FileRecord) -> Result<(), StoreError> {
        self.state.lock().files.insert(record.file_uuid.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartdrive_types::{ChunkEvent, MinerProcess, StoreEvent, StoreInputParams, StoreParams};

    fn store_block(n: u64, file_uuid: &str, owner: &Address) -> Block {
        let chunk_uuid = format!("chunk-{n}");
        let event = Event::Store(StoreEvent {
            uuid: format!("{n}_u"),
            validator_address: Address::new("validator"),
            event_params: StoreParams {
                file_uuid: file_uuid.to_string(),
                miners_processes: vec![MinerProcess {
                    chunk_uuid: Some(chunk_uuid.clone()),
                    miner_address: Address::new("miner-a"),
                    succeed: true,
                    processing_time: 0.1,
                }],
                created_at: Some(1_000),
                expiration_ms: None,
                chunks: vec![ChunkEvent {
                    uuid: chunk_uuid,
                    chunk_index: 0,
                    sub_chunk_start: 0,
                    sub_chunk_end: 10,
                    sub_chunk_encoded: "00".repeat(10),
                }],
            },
            event_signed_params: "sig".into(),
            user_address: owner.clone(),
            input_params: StoreInputParams { file_hash: "hash".into() },
            input_signed_params: "sig2".into(),
        });
        Block { block_number: n, events: vec![event], proposer_signature: "p".into(), proposer_address: Address::new("validator") }
    }

    use smartdrive_types::Event;

    #[test]
    fn append_block_rejects_out_of_order_numbers() {
        let store = MemoryStore::new();
        let owner = Address::new("owner");
        let err = store.append_block(store_block(2, "f1", &owner)).unwrap_err();
        assert!(matches!(err, StoreError::BlockNumberMismatch { expected: 1, got: 2 }));
    }

    #[test]
    fn store_event_populates_chunks_and_file() {
        let store = MemoryStore::new();
        let owner = Address::new("owner");
        store.append_block(store_block(1, "f1", &owner)).unwrap();
        assert_eq!(store.get_chunks_for_file("f1").unwrap().len(), 1);
        assert_eq!(store.list_files_owned_by(&owner).unwrap().len(), 1);
    }

    #[test]
    fn remove_clears_chunks_and_file() {
        let store = MemoryStore::new();
        let owner = Address::new("owner");
        store.append_block(store_block(1, "f1", &owner)).unwrap();
        let remove = Event::Remove(smartdrive_types::RemoveEvent {
            uuid: "2_u".into(),
            validator_address: Address::new("validator"),
            event_params: smartdrive_types::RemoveParams { file_uuid: "f1".into(), miners_processes: vec![] },
            event_signed_params: "s".into(),
            user_address: owner.clone(),
            input_params: smartdrive_types::RemoveInputParams { file_uuid: "f1".into() },
            input_signed_params: "s2".into(),
        });
        store
            .append_block(Block { block_number: 2, events: vec![remove], proposer_signature: "p".into(), proposer_address: Address::new("validator") })
            .unwrap();
        assert!(store.get_chunks_for_file("f1").unwrap().is_empty());
        assert!(store.list_files_owned_by(&owner).unwrap().is_empty());
    }
}
