//! Peer wire protocol payloads. The frame envelope itself
//! (`{body, signature_hex, public_key_hex}` plus the length-prefix) lives in
//! `smartdrive-net`, which is the crate that owns the socket; these are just
//! the `body.data` shapes so `smartdrive-types` stays the single source of
//! truth for anything that crosses the wire or gets signed.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::block::Block;
use crate::event::{Action, Event};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", content = "data")]
pub enum PeerMessage {
    #[serde(rename = "PING")]
    Ping,
    #[serde(rename = "EVENT")]
    Event { event_action: Action, event: Event },
    #[serde(rename = "BLOCK")]
    Block {
        block_number: u64,
        events: Vec<Event>,
        proposer_signature: String,
        proposer_address: Address,
    },
    #[serde(rename = "SYNC_REQUEST")]
    SyncRequest { start: u64, end: Option<u64> },
    #[serde(rename = "SYNC_RESPONSE")]
    SyncResponse { blocks: Vec<Block> },
}

impl PeerMessage {
    pub fn block_from(block: &Block) -> Self {
        PeerMessage::Block {
            block_number: block.block_number,
            events: block.events.clone(),
            proposer_signature: block.proposer_signature.clone(),
            proposer_address: block.proposer_address.clone(),
        }
    }

    pub fn into_block(self) -> Option<Block> {
        match self {
            PeerMessage::Block {
                block_number,
                events,
                proposer_signature,
                proposer_address,
            } => Some(Block {
                block_number,
                events,
                proposer_signature,
                proposer_address,
            }),
            _ => None,
        }
    }
}

/// The signed envelope carried by every peer frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub body: PeerMessage,
    pub signature_hex: String,
    pub public_key_hex: String,
}
