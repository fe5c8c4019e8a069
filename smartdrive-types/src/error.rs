use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("chunk range [{start}, {end}) is inverted or empty")]
    InvalidChunkRange { start: u64, end: u64 },
    #[error("audit window of {width} bytes exceeds MAX_ENCODED_RANGE")]
    AuditWindowTooWide { width: u64 },
    #[error("audit window hex length does not match the declared byte range")]
    AuditWindowLengthMismatch,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("canonical JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event action code: {0}")]
    UnknownAction(u8),
}
