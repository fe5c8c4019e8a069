use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("need at least {min} miners, got {got}")]
    TooFewMiners { min: usize, got: usize },
    #[error("replication quota unmet for chunk_index {chunk_index}: got {got}, need {need}")]
    ReplicationQuotaUnmet { chunk_index: u32, got: usize, need: usize },
    #[error("no candidate miners accepted the validation probe")]
    NoValidationResponders,
    #[error("file {0} has no chunk records")]
    UnknownFile(String),
    #[error("chunk_index {0} has no surviving replica")]
    NoSurvivingReplica(u32),
    #[error("persistence error: {0}")]
    Store(#[from] smartdrive_store::StoreError),
    #[error("chain oracle error: {0}")]
    Chain(#[from] smartdrive_chain::ChainError),
    #[error("signing failed: {0}")]
    Crypto(#[from] smartdrive_crypto::CryptoError),
    #[error("canonicalization failed: {0}")]
    Types(#[from] smartdrive_types::TypesError),
}
