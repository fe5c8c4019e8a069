//! The persistence contract and its backends.

pub mod apply;
pub mod error;
pub mod memory;
pub mod model;
pub mod sled_store;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use model::PendingValidation;
pub use sled_store::SledStore;
pub use traits::Persistence;
