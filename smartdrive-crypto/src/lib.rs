//! Crypto/address facade. Opaque operations over an address/keypair
//! model: `sign`, `verify`, `address_from_pubkey`. Every caller elsewhere in
//! the workspace treats signing as opaque and always signs/verifies the
//! canonical JSON bytes produced by `smartdrive_types::canonical_json` —
//! that contract, not any particular curve, is what makes validators
//! interoperable.

mod error;
mod ss58;

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;

pub use error::CryptoError;
use smartdrive_types::Address;

/// A keypair capable of signing on behalf of its own address.
pub trait Signer {
    fn sign_bytes(&self, data: &[u8]) -> Result<String, CryptoError>;
    fn address(&self) -> &Address;
}

/// An ed25519 keypair, and the address it signs as.
pub struct Keypair {
    signing_key: SigningKey,
    address: Address,
}

impl Keypair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = address_from_pubkey_bytes(signing_key.verifying_key().as_bytes());
        Self { signing_key, address }
    }

    /// Loads a keypair from a 32-byte secret seed, hex-encoded — the format
    /// the `--key` CLI flag points a file at.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(secret_hex)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidSecretKey)?;
        let signing_key = SigningKey::from_bytes(&bytes);
        let address = address_from_pubkey_bytes(signing_key.verifying_key().as_bytes());
        Ok(Self { signing_key, address })
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }
}

impl Signer for Keypair {
    fn sign_bytes(&self, data: &[u8]) -> Result<String, CryptoError> {
        Ok(hex::encode(self.signing_key.sign(data).to_bytes()))
    }

    fn address(&self) -> &Address {
        &self.address
    }
}

fn address_from_pubkey_bytes(pubkey: &[u8; 32]) -> Address {
    Address::new(ss58::encode(ss58::DEFAULT_PREFIX, pubkey))
}

/// Derives the SS58 address for a hex-encoded public key, or `None` if the
/// hex/length is malformed rather than raising.
pub fn address_from_pubkey(pubkey_hex: &str) -> Option<Address> {
    let bytes = hex::decode(pubkey_hex).ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    Some(address_from_pubkey_bytes(&bytes))
}

/// Recovers the raw public key bytes backing an address.
pub fn pubkey_from_address(address: &Address) -> Result<[u8; 32], CryptoError> {
    ss58::decode(address.as_str()).map(|(pk, _prefix)| pk)
}

/// Verifies that `signature_hex` is a valid signature over `data` by the key
/// behind `address`. Any malformed input — bad hex, bad address, bad
/// signature shape — returns `false` rather than erroring; callers (API
/// middleware, block ingest) treat verification failure uniformly.
pub fn verify(data: &[u8], signature_hex: &str, address: &Address) -> bool {
    let Ok(pubkey_bytes) = pubkey_from_address(address) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pubkey_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig_bytes): Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify(data, &signature).is_ok()
}

/// Signs `value`'s canonical JSON encoding and returns the hex signature.
pub fn sign_value<T: serde::Serialize>(
    signer: &impl Signer,
    value: &T,
) -> Result<String, CryptoError> {
    let bytes = smartdrive_types::canonical_json::canonical_bytes(value)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    signer.sign_bytes(&bytes)
}

/// Verifies `signature_hex` against `value`'s canonical JSON encoding.
pub fn verify_value<T: serde::Serialize>(value: &T, signature_hex: &str, address: &Address) -> bool {
    let Ok(bytes) = smartdrive_types::canonical_json::canonical_bytes(value) else {
        return false;
    };
    verify(&bytes, signature_hex, address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = Keypair::generate();
        let sig = kp.sign_bytes(b"hello").unwrap();
        assert!(verify(b"hello", &sig, kp.address()));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let kp = Keypair::generate();
        let sig = kp.sign_bytes(b"hello").unwrap();
        assert!(!verify(b"goodbye", &sig, kp.address()));
    }

    #[test]
    fn verify_rejects_wrong_address() {
        let kp = Keypair::generate();
        let other = Keypair::generate();
        let sig = kp.sign_bytes(b"hello").unwrap();
        assert!(!verify(b"hello", &sig, other.address()));
    }

    #[test]
    fn address_from_pubkey_matches_keypair_address() {
        let kp = Keypair::generate();
        let derived = address_from_pubkey(&kp.public_key_hex()).unwrap();
        assert_eq!(&derived, kp.address());
    }

    #[test]
    fn sign_value_canonicalizes_before_signing() {
        let kp = Keypair::generate();
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        let sig = sign_value(&kp, &a).unwrap();
        assert!(verify_value(&b, &sig, kp.address()));
    }

    #[test]
    fn address_from_pubkey_rejects_bad_hex() {
        assert!(address_from_pubkey("not-hex").is_none());
    }
}
