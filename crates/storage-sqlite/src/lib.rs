//! SQLite storage implementation for the gapfill crawler.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the store traits defined in `gapfill-core` and
//! contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for securities, prices, the trading
//!   calendar, and the coverage candidate queries
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies
//! exist. The core crate is database-agnostic and works with traits.
//!
//! ```text
//! core (domain)       market-data (providers)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod calendar;
pub mod coverage;
pub mod prices;
pub mod securities;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from gapfill-core for convenience
pub use gapfill_core::errors::{DatabaseError, Error, Result};
