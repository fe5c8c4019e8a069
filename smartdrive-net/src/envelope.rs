//! Signs and verifies the `{body, signature_hex, public_key_hex}` envelope
//! every peer frame carries. The signature covers canonical JSON of `body`.

use smartdrive_crypto::Signer;
use smartdrive_types::{Address, Envelope, PeerMessage};

use crate::error::NetError;

pub fn sign(signer: &impl Signer, body: PeerMessage) -> Result<Envelope, NetError> {
    let bytes = smartdrive_types::canonical_json::canonical_bytes(&body)?;
    let signature_hex = signer.sign_bytes(&bytes).map_err(|_| NetError::InvalidSignature)?;
    let public_key_hex = hex::encode(smartdrive_crypto::pubkey_from_address(signer.address()).map_err(|_| NetError::InvalidSignature)?);
    Ok(Envelope { body, signature_hex, public_key_hex })
}

/// Verifies `envelope`'s signature and returns the sender's address derived
/// from `public_key_hex`, or `None` on any failure (bad hex, bad key, bad
/// signature) — callers close the connection on `None`.
pub fn verify(envelope: &Envelope) -> Option<Address> {
    let address = smartdrive_crypto::address_from_pubkey(&envelope.public_key_hex)?;
    let bytes = smartdrive_types::canonical_json::canonical_bytes(&envelope.body).ok()?;
    if smartdrive_crypto::verify(&bytes, &envelope.signature_hex, &address) {
        Some(address)
    } else {
        None
    }
}
