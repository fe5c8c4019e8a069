//! Stake-gated auth middleware: every endpoint but `/ping` requires
//! `X-Key`/`X-Signature` headers, and the caller's aggregate stake to
//! validators must clear `MINIMUM_STAKE_COMAI`.

use std::collections::HashSet;

use axum::http::HeaderMap;

use smartdrive_types::constants::{MINIMUM_STAKE_COMAI, NANO_PER_COMAI};
use smartdrive_types::{Address, ModuleType};

use super::error::ApiError;
use crate::node::Node;

/// Verifies `signed_bytes` against the caller's `X-Key`/`X-Signature`
/// headers and checks their aggregate stake, returning the caller's address
/// and the signature hex (reused downstream as `input_signed_params`).
pub async fn authenticate(node: &Node, headers: &HeaderMap, signed_bytes: &[u8]) -> Result<(Address, String), ApiError> {
    let key_hex = header_str(headers, "x-key").ok_or_else(|| ApiError::Unauthorized("missing X-Key".into()))?;
    let signature_hex = header_str(headers, "x-signature").ok_or_else(|| ApiError::Unauthorized("missing X-Signature".into()))?;

    let address = smartdrive_crypto::address_from_pubkey(key_hex).ok_or_else(|| ApiError::Unauthorized("malformed X-Key".into()))?;

    if !smartdrive_crypto::verify(signed_bytes, signature_hex, &address) {
        return Err(ApiError::Unauthorized("signature does not verify".into()));
    }

    let stake_to = node.oracle.get_stake_to(&address, node.config.netuid).await?;
    let validators = node.oracle.get_modules(node.config.netuid, ModuleType::Validator).await?;
    let validator_addresses: HashSet<&Address> = validators.iter().map(|m| &m.address).collect();

    let total_nano: u64 = stake_to
        .iter()
        .filter(|entry| {
            let candidate: &Address = entry.0;
            validator_addresses.contains(candidate) && candidate != &address
        })
        .map(|entry| *entry.1)
        .sum();
    let total_comai = total_nano / NANO_PER_COMAI;
    if total_comai < MINIMUM_STAKE_COMAI {
        return Err(ApiError::Unauthorized(format!("must stake at least {MINIMUM_STAKE_COMAI} COMAI")));
    }

    Ok((address, signature_hex.to_string()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}
