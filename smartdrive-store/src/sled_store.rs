//! A `sled`-backed `Persistence`: a single trait, one of its
//! implementations chosen by the binary at startup, backed here by `sled`
//! alone since SmartDrive's working set (blocks, a chunk index, a handful
//! of pending audits) doesn't need a multi-backend matrix to stay fast.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use smartdrive_types::constants::VALIDATION_VOTE_INTERVAL_SECONDS;
use smartdrive_types::{Address, Block, ChunkRecord, FileRecord, ValidateEvent};

use crate::apply::effects_for;
use crate::error::StoreError;
use crate::model::PendingValidation;
use crate::traits::Persistence;

const TREE_BLOCKS: &str = "blocks";
const TREE_CHUNKS: &str = "chunks";
const TREE_CHUNKS_BY_FILE: &str = "chunks_by_file";
const TREE_FILES: &str = "files";
const TREE_PENDING: &str = "pending";

pub struct SledStore {
    db: sled::Db,
    next_pending_id: AtomicU64,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let next_pending_id = db
            .open_tree(TREE_PENDING)?
            .iter()
            .keys()
            .filter_map(|k| k.ok())
            .filter_map(|k| std::str::from_utf8(&k).ok().and_then(|s| s.parse::<u64>().ok()))
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        Ok(Self { db, next_pending_id: AtomicU64::new(next_pending_id) })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(name)?)
    }

    fn get_json<T: serde::de::DeserializeOwned>(tree: &sled::Tree, key: impl AsRef<[u8]>) -> Result<Option<T>, StoreError> {
        match tree.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(tree: &sled::Tree, key: impl AsRef<[u8]>, value: &T) -> Result<(), StoreError> {
        tree.insert(key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn schedule_pending(&self, chunks: &sled::Tree, pending: &sled::Tree, chunk_uuid: &str, now_ms: i64) -> Result<(), StoreError> {
        let Some(chunk): Option<ChunkRecord> = Self::get_json(chunks, chunk_uuid)? else {
            tracing::warn!(chunk_uuid, "validation event referenced unknown chunk, skipping schedule");
            return Ok(());
        };
        let id = self.next_pending_id.fetch_add(1, Ordering::SeqCst);
        let record = PendingValidation {
            id,
            file_uuid: chunk.file_uuid,
            chunk_uuid: chunk.chunk_uuid,
            miner_address: chunk.miner_address,
            sub_chunk_start: chunk.sub_chunk_start,
            sub_chunk_end: chunk.sub_chunk_end,
            sub_chunk_encoded: chunk.sub_chunk_encoded,
            next_due_at_ms: now_ms + (VALIDATION_VOTE_INTERVAL_SECONDS as i64) * 1000,
        };
        Self::put_json(pending, id.to_string(), &record)
    }
}

impl Persistence for SledStore {
    fn append_block(&self, block: Block) -> Result<(), StoreError> {
        let blocks = self.tree(TREE_BLOCKS)?;
        let expected = blocks.len() as u64 + 1;
        if block.block_number != expected {
            return Err(StoreError::BlockNumberMismatch { expected, got: block.block_number });
        }

        let chunks = self.tree(TREE_CHUNKS)?;
        let chunks_by_file = self.tree(TREE_CHUNKS_BY_FILE)?;
        let files = self.tree(TREE_FILES)?;
        let pending = self.tree(TREE_PENDING)?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        for event in &block.events {
            let effects = effects_for(event, now_ms);
            for record in effects.chunk_records {
                let mut index: Vec<String> =
                    Self::get_json(&chunks_by_file, &record.file_uuid)?.unwrap_or_default();
                index.push(record.chunk_uuid.clone());
                Self::put_json(&chunks_by_file, &record.file_uuid, &index)?;
                Self::put_json(&chunks, &record.chunk_uuid, &record)?;
            }
            if let Some(file) = effects.file_insert {
                Self::put_json(&files, &file.file_uuid, &file)?;
            }
            if let Some(file_uuid) = effects.file_delete {
                files.remove(&file_uuid)?;
                if let Some(index) = chunks_by_file.remove(&file_uuid)? {
                    let uuids: Vec<String> = serde_json::from_slice(&index)?;
                    for chunk_uuid in uuids {
                        chunks.remove(&chunk_uuid)?;
                    }
                }
            }
            for chunk_uuid in effects.schedule_validation_for {
                self.schedule_pending(&chunks, &pending, &chunk_uuid, now_ms)?;
            }
        }

        Self::put_json(&blocks, expected.to_string(), &block)?;
        Ok(())
    }

    fn last_block_number(&self) -> u64 {
        self.tree(TREE_BLOCKS).map(|t| t.len() as u64).unwrap_or(0)
    }

    fn get_block(&self, number: u64) -> Result<Option<Block>, StoreError> {
        if number == 0 {
            return Ok(None);
        }
        Self::get_json(&self.tree(TREE_BLOCKS)?, number.to_string())
    }

    fn iter_blocks(&self, from: u64, to: u64) -> Result<Vec<Block>, StoreError> {
        let blocks = self.tree(TREE_BLOCKS)?;
        let from = from.max(1);
        let mut out = Vec::new();
        for n in from..=to {
            if let Some(b) = Self::get_json(&blocks, n.to_string())? {
                out.push(b);
            }
        }
        Ok(out)
    }

    fn insert_chunk_records(&self, records: Vec<ChunkRecord>) -> Result<(), StoreError> {
        let chunks = self.tree(TREE_CHUNKS)?;
        let chunks_by_file = self.tree(TREE_CHUNKS_BY_FILE)?;
        for record in records {
            let mut index: Vec<String> =
                Self::get_json(&chunks_by_file, &record.file_uuid)?.unwrap_or_default();
            index.push(record.chunk_uuid.clone());
            Self::put_json(&chunks_by_file, &record.file_uuid, &index)?;
            Self::put_json(&chunks, &record.chunk_uuid, &record)?;
        }
        Ok(())
    }

    fn delete_file(&self, file_uuid: &str) -> Result<(), StoreError> {
        let chunks = self.tree(TREE_CHUNKS)?;
        let chunks_by_file = self.tree(TREE_CHUNKS_BY_FILE)?;
        let files = self.tree(TREE_FILES)?;
        files.remove(file_uuid)?;
        if let Some(index) = chunks_by_file.remove(file_uuid)? {
            let uuids: Vec<String> = serde_json::from_slice(&index)?;
            for chunk_uuid in uuids {
                chunks.remove(&chunk_uuid)?;
            }
        }
        Ok(())
    }

    fn list_files_owned_by(&self, owner: &Address) -> Result<Vec<FileRecord>, StoreError> {
        let files = self.tree(TREE_FILES)?;
        let mut out = Vec::new();
        for item in files.iter() {
            let (_, bytes) = item?;
            let record: FileRecord = serde_json::from_slice(&bytes)?;
            if &record.owner_address == owner {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn get_chunks_for_file(&self, file_uuid: &str) -> Result<Vec<ChunkRecord>, StoreError> {
        let chunks = self.tree(TREE_CHUNKS)?;
        let chunks_by_file = self.tree(TREE_CHUNKS_BY_FILE)?;
        let index: Vec<String> = Self::get_json(&chunks_by_file, file_uuid)?.unwrap_or_default();
        let mut out = Vec::with_capacity(index.len());
        for chunk_uuid in index {
            if let Some(c) = Self::get_json(&chunks, &chunk_uuid)? {
                out.push(c);
            }
        }
        Ok(out)
    }

    fn get_chunk(&self, chunk_uuid: &str) -> Result<Option<ChunkRecord>, StoreError> {
        Self::get_json(&self.tree(TREE_CHUNKS)?, chunk_uuid)
    }

    fn get_chunks_for_miner(&self, miner_address: &Address) -> Result<Vec<ChunkRecord>, StoreError> {
        let chunks = self.tree(TREE_CHUNKS)?;
        let mut out = Vec::new();
        for entry in chunks.iter().values() {
            let record: ChunkRecord = serde_json::from_slice(&entry?)?;
            if &record.miner_address == miner_address {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn insert_validation_events(&self, events: &[ValidateEvent]) -> Result<(), StoreError> {
        let chunks = self.tree(TREE_CHUNKS)?;
        let pending = self.tree(TREE_PENDING)?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        for event in events {
            for chunk_uuid in event
                .event_params
                .miners_processes
                .iter()
                .filter(|p| p.succeed)
                .filter_map(|p| p.chunk_uuid.clone())
            {
                self.schedule_pending(&chunks, &pending, &chunk_uuid, now_ms)?;
            }
        }
        Ok(())
    }

    fn pop_due_validations(&self, now_ms: i64, limit: usize) -> Result<Vec<PendingValidation>, StoreError> {
        let pending = self.tree(TREE_PENDING)?;
        let mut due = Vec::new();
        for item in pending.iter() {
            let (key, bytes) = item?;
            let record: PendingValidation = serde_json::from_slice(&bytes)?;
            if record.next_due_at_ms <= now_ms {
                due.push((key, record));
                if due.len() >= limit {
                    break;
                }
            }
        }
        for (key, _) in &due {
            pending.remove(key)?;
        }
        Ok(due.into_iter().map(|(_, r)| r).collect())
    }

    fn expired_files(&self, now_ms: i64) -> Result<Vec<String>, StoreError> {
        let files = self.tree(TREE_FILES)?;
        let mut out = Vec::new();
        for item in files.iter() {
            let (_, bytes) = item?;
            let record: FileRecord = serde_json::from_slice(&bytes)?;
            if record.is_expired(now_ms) {
                out.push(record.file_uuid);
            }
        }
        Ok(out)
    }

    fn insert_file_record(&self, record: FileRecord) -> Result<(), StoreError> {
        Self::put_json(&self.tree(TREE_FILES)?, &record.file_uuid, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_tracks_last_block_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.last_block_number(), 0);
    }
}
