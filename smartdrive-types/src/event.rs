use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::canonical_json::canonical_bytes;
use crate::error::TypesError;

/// Discriminant for the `Event` sum type. Dispatch on this is a pure switch,
/// never a class hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Store,
    Remove,
    Retrieve,
    Validation,
}

/// Outcome of one miner's participation in a store/remove/retrieve/validate
/// operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinerProcess {
    pub chunk_uuid: Option<String>,
    pub miner_address: Address,
    pub succeed: bool,
    /// Wall-clock seconds the RPC took.
    pub processing_time: f64,
}

/// One shard replica as recorded inside an event's `chunks` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkEvent {
    pub uuid: String,
    pub chunk_index: u32,
    pub sub_chunk_start: u64,
    pub sub_chunk_end: u64,
    pub sub_chunk_encoded: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreParams {
    pub file_uuid: String,
    pub miners_processes: Vec<MinerProcess>,
    pub created_at: Option<i64>,
    pub expiration_ms: Option<i64>,
    pub chunks: Vec<ChunkEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoveParams {
    pub file_uuid: String,
    pub miners_processes: Vec<MinerProcess>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveParams {
    pub file_uuid: String,
    pub miners_processes: Vec<MinerProcess>,
}

/// Same shape as `RemoveParams`/`RetrieveParams`: represents an audit outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidateParams {
    pub file_uuid: String,
    pub miners_processes: Vec<MinerProcess>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreInputParams {
    /// Hex digest of the uploaded file's contents, what the user actually
    /// signed (the raw bytes themselves are never part of the signed JSON).
    pub file_hash: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoveInputParams {
    pub file_uuid: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveInputParams {
    pub file_uuid: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub uuid: String,
    pub validator_address: Address,
    pub event_params: StoreParams,
    pub event_signed_params: String,
    pub user_address: Address,
    pub input_params: StoreInputParams,
    pub input_signed_params: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoveEvent {
    pub uuid: String,
    pub validator_address: Address,
    pub event_params: RemoveParams,
    pub event_signed_params: String,
    pub user_address: Address,
    pub input_params: RemoveInputParams,
    pub input_signed_params: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrieveEvent {
    pub uuid: String,
    pub validator_address: Address,
    pub event_params: RetrieveParams,
    pub event_signed_params: String,
    pub user_address: Address,
    pub input_params: RetrieveInputParams,
    pub input_signed_params: String,
}

/// Validator-originated: no `user_*` fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidateEvent {
    pub uuid: String,
    pub validator_address: Address,
    pub event_params: ValidateParams,
    pub event_signed_params: String,
}

/// The event sum type. Tagged by `action` on the wire so a peer can dispatch
/// without knowing the variant ahead of time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum Event {
    #[serde(rename = "STORE")]
    Store(StoreEvent),
    #[serde(rename = "REMOVE")]
    Remove(RemoveEvent),
    #[serde(rename = "RETRIEVE")]
    Retrieve(RetrieveEvent),
    #[serde(rename = "VALIDATION")]
    Validation(ValidateEvent),
}

impl Event {
    pub fn action(&self) -> Action {
        match self {
            Event::Store(_) => Action::Store,
            Event::Remove(_) => Action::Remove,
            Event::Retrieve(_) => Action::Retrieve,
            Event::Validation(_) => Action::Validation,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            Event::Store(e) => &e.uuid,
            Event::Remove(e) => &e.uuid,
            Event::Retrieve(e) => &e.uuid,
            Event::Validation(e) => &e.uuid,
        }
    }

    pub fn validator_address(&self) -> &Address {
        match self {
            Event::Store(e) => &e.validator_address,
            Event::Remove(e) => &e.validator_address,
            Event::Retrieve(e) => &e.validator_address,
            Event::Validation(e) => &e.validator_address,
        }
    }

    pub fn event_signed_params(&self) -> &str {
        match self {
            Event::Store(e) => &e.event_signed_params,
            Event::Remove(e) => &e.event_signed_params,
            Event::Retrieve(e) => &e.event_signed_params,
            Event::Validation(e) => &e.event_signed_params,
        }
    }

    /// The file this event concerns, for mempool/dedup bookkeeping.
    pub fn file_uuid(&self) -> &str {
        match self {
            Event::Store(e) => &e.event_params.file_uuid,
            Event::Remove(e) => &e.event_params.file_uuid,
            Event::Retrieve(e) => &e.event_params.file_uuid,
            Event::Validation(e) => &e.event_params.file_uuid,
        }
    }

    /// Canonical JSON bytes of `event_params`, the payload `event_signed_params`
    /// must verify against.
    pub fn event_params_bytes(&self) -> Result<Vec<u8>, TypesError> {
        match self {
            Event::Store(e) => canonical_bytes(&e.event_params),
            Event::Remove(e) => canonical_bytes(&e.event_params),
            Event::Retrieve(e) => canonical_bytes(&e.event_params),
            Event::Validation(e) => canonical_bytes(&e.event_params),
        }
    }

    /// `(user_address, input_params_bytes, input_signed_params)` for the
    /// user-originated variants; `None` for `Validation`.
    pub fn user_signed_input(&self) -> Result<Option<(&Address, Vec<u8>, &str)>, TypesError> {
        Ok(match self {
            Event::Store(e) => Some((
                &e.user_address,
                canonical_bytes(&e.input_params)?,
                e.input_signed_params.as_str(),
            )),
            Event::Remove(e) => Some((
                &e.user_address,
                canonical_bytes(&e.input_params)?,
                e.input_signed_params.as_str(),
            )),
            Event::Retrieve(e) => Some((
                &e.user_address,
                canonical_bytes(&e.input_params)?,
                e.input_signed_params.as_str(),
            )),
            Event::Validation(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_tagged_json() {
        let ev = Event::Validation(ValidateEvent {
            uuid: "1_u".into(),
            validator_address: Address::new("v"),
            event_params: ValidateParams {
                file_uuid: "f".into(),
                miners_processes: vec![],
            },
            event_signed_params: "deadbeef".into(),
        });
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
        assert_eq!(back.action(), Action::Validation);
    }
}
