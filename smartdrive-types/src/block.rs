use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::canonical_json::canonical_bytes;
use crate::error::TypesError;
use crate::event::Event;

/// A sealed, signed batch of events. Block numbers are dense and monotonic
/// starting at 1; `events.len() <= MAX_EVENTS_PER_BLOCK`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_number: u64,
    pub events: Vec<Event>,
    pub proposer_signature: String,
    pub proposer_address: Address,
}

/// The exact payload covered by `proposer_signature`: `{block_number, events}`
/// as canonical JSON.
#[derive(Serialize)]
pub struct BlockSignPayload<'a> {
    pub block_number: u64,
    pub events: &'a [Event],
}

impl Block {
    pub fn sign_payload_bytes(&self) -> Result<Vec<u8>, TypesError> {
        canonical_bytes(&BlockSignPayload {
            block_number: self.block_number,
            events: &self.events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_payload_is_stable_for_equal_content() {
        let b1 = Block {
            block_number: 1,
            events: vec![],
            proposer_signature: "x".into(),
            proposer_address: Address::new("a"),
        };
        let b2 = Block {
            block_number: 1,
            events: vec![],
            proposer_signature: "y".into(),
            proposer_address: Address::new("b"),
        };
        assert_eq!(b1.sign_payload_bytes().unwrap(), b2.sign_payload_bytes().unwrap());
    }
}
