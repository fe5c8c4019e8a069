//! Node-local engines: placement/redundancy, validation, block
//! production, and block ingestion. These sit above
//! `smartdrive-store`/`smartdrive-chain`/`smartdrive-net` and below the
//! `smartdrive` binary, which owns the wall-clock loops and wires them
//! together.

pub mod error;
pub mod ingestor;
pub mod placement;
pub mod producer;
pub mod proposer;
pub mod validation;

pub use error::NodeError;
pub use ingestor::{BlockIngestor, IngestOutcome};
pub use placement::PlacementEngine;
pub use producer::BlockProducer;
pub use proposer::{elect_proposer, Candidate};
pub use validation::{ValidationEngine, ValidationOutcome};
