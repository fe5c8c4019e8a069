use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid public key bytes")]
    InvalidPubKey,
    #[error("invalid secret key bytes")]
    InvalidSecretKey,
    #[error("invalid signature bytes")]
    InvalidSignature,
    #[error("address is not valid base58")]
    InvalidBase58,
    #[error("address checksum mismatch")]
    ChecksumMismatch,
    #[error("address has the wrong length")]
    WrongLength,
    #[error("failed to produce a signature: {0}")]
    SigningFailed(String),
}
