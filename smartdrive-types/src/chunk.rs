use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TypesError;

/// One replica of one shard held by one miner.
///
/// Invariant: `sub_chunk_end - sub_chunk_start <= MAX_ENCODED_RANGE`, and
/// `sub_chunk_encoded` is the hex of the raw shard bytes over
/// `[sub_chunk_start, sub_chunk_end)`, captured at store time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_uuid: String,
    pub file_uuid: String,
    pub chunk_index: u32,
    pub miner_address: Address,
    pub sub_chunk_start: u64,
    pub sub_chunk_end: u64,
    pub sub_chunk_encoded: String,
}

impl ChunkRecord {
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.sub_chunk_end <= self.sub_chunk_start {
            return Err(TypesError::InvalidChunkRange {
                start: self.sub_chunk_start,
                end: self.sub_chunk_end,
            });
        }
        if self.sub_chunk_end - self.sub_chunk_start > crate::constants::MAX_ENCODED_RANGE as u64 {
            return Err(TypesError::AuditWindowTooWide {
                width: self.sub_chunk_end - self.sub_chunk_start,
            });
        }
        let expected_bytes = (self.sub_chunk_end - self.sub_chunk_start) as usize;
        if self.sub_chunk_encoded.len() != expected_bytes * 2 {
            return Err(TypesError::AuditWindowLengthMismatch);
        }
        Ok(())
    }

    pub fn decoded_window(&self) -> Result<Vec<u8>, TypesError> {
        hex::decode(&self.sub_chunk_encoded).map_err(|_| TypesError::InvalidHex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start: u64, end: u64, encoded: &str) -> ChunkRecord {
        ChunkRecord {
            chunk_uuid: "c".into(),
            file_uuid: "f".into(),
            chunk_index: 0,
            miner_address: Address::new("miner"),
            sub_chunk_start: start,
            sub_chunk_end: end,
            sub_chunk_encoded: encoded.into(),
        }
    }

    #[test]
    fn rejects_oversized_window() {
        let r = record(0, 51, &"ab".repeat(51));
        assert!(matches!(r.validate(), Err(TypesError::AuditWindowTooWide { .. })));
    }

    #[test]
    fn rejects_inverted_range() {
        let r = record(10, 5, "");
        assert!(matches!(r.validate(), Err(TypesError::InvalidChunkRange { .. })));
    }

    #[test]
    fn accepts_well_formed_record() {
        let r = record(10, 20, &"ab".repeat(10));
        assert!(r.validate().is_ok());
    }
}
