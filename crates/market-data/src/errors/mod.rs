//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`ProviderError`]: The main error enum for all upstream fetch operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching daily bars from an upstream provider.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method. The crawl loop uses the
/// classification (together with [`is_benign`](Self::is_benign)) to decide
/// whether a fetch counts as completed, should be retried, or should be
/// recorded as a unit failure.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider has no data for the requested instrument or date.
    ///
    /// This is a completed call, not a failure: the instrument may be
    /// delisted or never covered. The caller may mark the security as
    /// permanently unavailable from this provider.
    #[error("No data for '{symbol}'")]
    NoData {
        /// The ticker or exchange segment that came back empty
        symbol: String,
    },

    /// The provider rate limited the request (HTTP 429).
    /// Should retry with backoff.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out (client deadline or HTTP 408).
    /// Should retry with backoff.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A gateway or proxy in front of the provider gave up (HTTP 502/503/504).
    ///
    /// Distinguished from [`Timeout`](Self::Timeout) via the response status:
    /// the upstream may be healthy but the requested scope too large for the
    /// intermediary's deadline.
    #[error("Gateway timeout (HTTP {status})")]
    GatewayTimeout {
        /// The gateway status code that was returned
        status: u16,
    },

    /// A provider-specific error occurred (unexpected status or payload).
    #[error("Provider error: {provider} - {message}")]
    Upstream {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A transport-level error occurred before a response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use gapfill_market_data::errors::{ProviderError, RetryClass};
    ///
    /// let error = ProviderError::RateLimited { provider: "EODHD".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = ProviderError::NoData { symbol: "XZYQ".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Conclusive answer - repeating the request changes nothing
            Self::NoData { .. } => RetryClass::Never,

            // Transient conditions - same request, later
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Upstream { .. }
            | Self::Network(_) => RetryClass::WithBackoff,

            // The intermediary gave up, not the provider - narrow the request
            Self::GatewayTimeout { .. } => RetryClass::ReduceScope,
        }
    }

    /// Returns true if this error represents a completed call with an empty
    /// answer rather than a failure.
    ///
    /// Benign results are charged to the budget like successful fetches and
    /// are never logged at error level.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}
