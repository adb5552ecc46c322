//! Price data provider abstractions and implementations.
//!
//! This module contains:
//! - The `PriceDataProvider` trait that all providers implement
//! - Rate limiting configuration reported by each provider
//! - The concrete EODHD implementation
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: The crawler core doesn't know about specific providers
//! - **Extensible**: New providers can be added by implementing `PriceDataProvider`
//! - **Environment-aware**: The same implementation serves production, staging
//!   and local stub gateways via [`crate::ApiEnvironment`]

mod traits;

// Provider implementations
pub mod eodhd;

// Re-exports
pub use eodhd::EodhdProvider;
pub use traits::{PriceDataProvider, RateLimit};
