use thiserror::Error;

/// Errors surfaced by the chain oracle client. Every variant collapses
/// to `NetworkUnreachable` at retry exhaustion — callers treat that as a
/// transient error that aborts the current round.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain oracle unreachable after {attempts} attempts: {source}")]
    NetworkUnreachable { attempts: u32, source: reqwest::Error },
    #[error("chain oracle returned malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}
