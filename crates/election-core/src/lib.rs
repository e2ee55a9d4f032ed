//! Generation core for the Election Live service.
//!
//! - [`factory`] -- random candidate drafts
//! - [`store`] -- the candidate store gateway contract and two gateways
//! - [`registry`] -- per-connection generation runs (start, stop, status,
//!   cleanup, periodic ticks)
//! - [`config`] -- typed `election-config.yaml`

pub mod config;
pub mod factory;
pub mod registry;
pub mod store;

pub use config::{ConfigError, LiveConfig};
pub use registry::{GenerationOutcome, GenerationRegistry, GenerationSink, RegistryError};
pub use store::{CandidateStore, JsonFileStore, MemoryStore, StoreError};
