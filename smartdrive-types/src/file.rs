use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A file exists iff at least one `ChunkRecord` references it. Created by a
/// successful `StoreEvent`, destroyed by a `RemoveEvent` or expiration sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_uuid: String,
    pub owner_address: Address,
    pub created_at_ms: i64,
    pub expiration_ms: Option<i64>,
}

impl FileRecord {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expiration_ms, Some(exp) if now_ms >= exp)
    }
}
