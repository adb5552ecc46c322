//! Gapfill Market Data Crate
//!
//! This crate provides provider-facing fetch capabilities for the historical
//! price crawler: daily OHLCV bars, either for one ticker over a date range
//! or for a whole exchange on a single date.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Per-ticker history fetches over an inclusive date range
//! - Whole-exchange bulk fetches for a single trading day
//! - Environment-based gateway selection (production, staging, local stub)
//! - Error classification that tells callers how to react (retry, back off,
//!   reduce scope, or give up)
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Crawler Core    | --> |  ApiEnvironment  |  (gateway selection)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | PriceDataProvider|  (trait)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  EodhdProvider   |  (HTTP implementation)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    DailyBar      |  (OHLCV row)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`DailyBar`] - One day of OHLCV data for one ticker
//! - [`PriceDataProvider`] - Trait all fetch backends implement
//! - [`ProviderError`] - Fetch failure, classified via [`RetryClass`]
//! - [`ApiEnvironment`] - Which gateway a session talks to

pub mod environment;
pub mod errors;
pub mod models;
pub mod provider;

// Re-export all public types from models
pub use models::DailyBar;

// Re-export error types
pub use errors::{ProviderError, RetryClass};

// Re-export provider types
pub use environment::ApiEnvironment;
pub use provider::eodhd::EodhdProvider;
pub use provider::{PriceDataProvider, RateLimit};
