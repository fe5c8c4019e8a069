use serde::{Deserialize, Serialize};

use smartdrive_types::Address;

/// A pending audit probe, denormalized from the `ChunkRecord` it was seeded
/// from at the moment it was scheduled. Carries everything
/// `smartdrive-node`'s validation engine needs to issue the probe and judge
/// the response without a second lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingValidation {
    pub id: u64,
    pub file_uuid: String,
    pub chunk_uuid: String,
    pub miner_address: Address,
    pub sub_chunk_start: u64,
    pub sub_chunk_end: u64,
    pub sub_chunk_encoded: String,
    pub next_due_at_ms: i64,
}
