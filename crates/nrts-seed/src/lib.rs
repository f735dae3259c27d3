//! `nrts-seed` - Idempotent bootstrap seeding for the NRTS development database
//!
//! This library ensures a single well-known sample land application exists in
//! a document store, inserting it only when it is absent.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod seeder;
pub mod store;

pub use config::{Config, StoreBackend};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{BootstrapRecord, Centroid, RecordId};
pub use seeder::{SeedOutcome, SeedPlan, SeedState, Seeder, DEFAULT_COMPLETION_MARKER};
pub use store::{DocumentStore, MemoryStore, SqliteStore};
