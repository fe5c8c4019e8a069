use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("expected block_number {expected}, got {got}")]
    BlockNumberMismatch { expected: u64, got: u64 },
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}
