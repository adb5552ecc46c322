//! Idempotent persistence of fetched data.

mod service;

pub use service::{PriceSyncService, SyncReport};
