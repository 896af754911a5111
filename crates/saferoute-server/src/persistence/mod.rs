//! Persistence layer for SafeRoute Server.
//!
//! SQLite-backed storage for hazards and the JSON shelter reference file.
//! Hazards use write-through caching with DashMap for hot data access.

pub mod db;
pub mod hazards;
pub mod shelters;

pub use db::{init_database, Database};
pub use shelters::ShelterFile;
