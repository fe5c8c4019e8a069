//! Shared data model for the SmartDrive validator: entities, the canonical
//! JSON encoding that every signature in the system is computed over, and
//! the wire payload shapes shared between the peer and public-API
//! surfaces.

pub mod address;
pub mod block;
pub mod canonical_json;
pub mod chunk;
pub mod constants;
pub mod error;
pub mod event;
pub mod file;
pub mod ids;
pub mod module;
pub mod wire;

pub use address::Address;
pub use block::{Block, BlockSignPayload};
pub use chunk::ChunkRecord;
pub use error::TypesError;
pub use event::{
    Action, ChunkEvent, Event, MinerProcess, RemoveEvent, RemoveInputParams, RemoveParams,
    RetrieveEvent, RetrieveInputParams, RetrieveParams, StoreEvent, StoreInputParams, StoreParams,
    ValidateEvent, ValidateParams,
};
pub use file::FileRecord;
pub use module::{ConnectionInfo, Module, ModuleType};
pub use wire::{Envelope, PeerMessage};
