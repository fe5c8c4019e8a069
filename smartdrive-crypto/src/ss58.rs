//! A minimal SS58-style address codec: `base58(prefix || pubkey || checksum)`,
//! checksum = first 2 bytes of `blake2b-512("SS58PRE" || prefix || pubkey)`.
//! This is the same construction Substrate-family chains use for their
//! addresses, which is what gives SmartDrive's 48-character addresses their
//! shape. Unlike a content hash, this encoding is reversible: the
//! public key can always be recovered from the address, which is what lets
//! `verify(bytes, sig, address)` work without a separate key registry.

use blake2::{Blake2b512, Digest};

use crate::error::CryptoError;

pub const DEFAULT_PREFIX: u8 = 42;
const CONTEXT: &[u8] = b"SS58PRE";

fn checksum(prefix: u8, pubkey: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b512::new();
    hasher.update(CONTEXT);
    hasher.update([prefix]);
    hasher.update(pubkey);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

pub fn encode(prefix: u8, pubkey: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(1 + 32 + 2);
    payload.push(prefix);
    payload.extend_from_slice(pubkey);
    payload.extend_from_slice(&checksum(prefix, pubkey));
    bs58::encode(payload).into_string()
}

pub fn decode(address: &str) -> Result<([u8; 32], u8), CryptoError> {
    let raw = bs58::decode(address)
        .into_vec()
        .map_err(|_| CryptoError::InvalidBase58)?;
    if raw.len() != 1 + 32 + 2 {
        return Err(CryptoError::WrongLength);
    }
    let prefix = raw[0];
    let pubkey = &raw[1..33];
    let want = checksum(prefix, pubkey);
    if raw[33..35] != want {
        return Err(CryptoError::ChecksumMismatch);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(pubkey);
    Ok((out, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let pk = [7u8; 32];
        let addr = encode(DEFAULT_PREFIX, &pk);
        let (decoded, prefix) = decode(&addr).unwrap();
        assert_eq!(decoded, pk);
        assert_eq!(prefix, DEFAULT_PREFIX);
    }

    #[test]
    fn detects_tampering() {
        let pk = [9u8; 32];
        let mut addr = encode(DEFAULT_PREFIX, &pk);
        addr.replace_range(0..1, if addr.starts_with('a') { "b" } else { "a" });
        assert!(decode(&addr).is_err());
    }
}
