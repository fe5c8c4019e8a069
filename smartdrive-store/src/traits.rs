use smartdrive_types::{Address, Block, ChunkRecord, FileRecord, ValidateEvent};

use crate::error::StoreError;
use crate::model::PendingValidation;

/// The abstract storage contract. Every method is synchronous from the
/// caller's perspective and is expected to be atomic per call — callers never
/// see a partially-applied block or a torn chunk index.
pub trait Persistence: Send + Sync {
    /// Appends `block` as `last_block_number() + 1`, applying every contained
    /// event's side effects (chunk inserts, file deletes, pending-validation
    /// inserts) as part of the same atomic call.
    fn append_block(&self, block: Block) -> Result<(), StoreError>;

    fn last_block_number(&self) -> u64;

    fn get_block(&self, number: u64) -> Result<Option<Block>, StoreError>;

    fn iter_blocks(&self, from: u64, to: u64) -> Result<Vec<Block>, StoreError>;

    fn insert_chunk_records(&self, records: Vec<ChunkRecord>) -> Result<(), StoreError>;

    fn delete_file(&self, file_uuid: &str) -> Result<(), StoreError>;

    fn list_files_owned_by(&self, owner: &Address) -> Result<Vec<FileRecord>, StoreError>;

    fn get_chunks_for_file(&self, file_uuid: &str) -> Result<Vec<ChunkRecord>, StoreError>;

    fn get_chunk(&self, chunk_uuid: &str) -> Result<Option<ChunkRecord>, StoreError>;

    /// Every `ChunkRecord` a given miner currently holds, across every
    /// file — the basis for the validation engine's utilization score.
    fn get_chunks_for_miner(&self, miner_address: &Address) -> Result<Vec<ChunkRecord>, StoreError>;

    /// Schedules every miner process inside `events` as a pending audit,
    /// keyed by the `ChunkRecord` its `chunk_uuid` already identifies.
    fn insert_validation_events(&self, events: &[ValidateEvent]) -> Result<(), StoreError>;

    fn pop_due_validations(&self, now_ms: i64, limit: usize) -> Result<Vec<PendingValidation>, StoreError>;

    fn expired_files(&self, now_ms: i64) -> Result<Vec<String>, StoreError>;

    /// Records a newly-created `FileRecord`. `append_block`'s Store-event
    /// side effect needs somewhere to put it, and
    /// `delete_file`/`list_files_owned_by`/`expired_files` need somewhere
    /// to read it from.
    fn insert_file_record(&self, record: FileRecord) -> Result<(), StoreError>;
}
