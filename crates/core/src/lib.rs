//! Gapfill Core - Coverage gap detection and budgeted backfill scheduling.
//!
//! This crate contains the domain logic for the historical price crawler.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate; provider access goes through the
//! `gapfill-market-data` crate.

pub mod backfill;
pub mod budget;
pub mod calendar;
pub mod constants;
pub mod coverage;
pub mod errors;
pub mod events;
pub mod fill;
pub mod prices;
pub mod securities;
pub mod sync;

// Re-export common types from the coverage and scheduling modules
pub use backfill::*;
pub use coverage::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
