use thiserror::Error;

/// Errors from the peer wire protocol. Any of these closes the
/// connection; the tracker is responsible for re-dialing.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {size} bytes exceeds the {limit}-byte maximum")]
    FrameTooLarge { size: u32, limit: u32 },
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
    #[error("failed to canonicalize payload: {0}")]
    Canonicalize(#[from] smartdrive_types::TypesError),
    #[error("envelope signature does not verify")]
    InvalidSignature,
    #[error("connection closed")]
    Closed,
}
