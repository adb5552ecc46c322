//! Provider trait for upstream daily price data.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::models::DailyBar;

/// Rate limiting parameters for a provider.
#[derive(Clone, Copy, Debug)]
pub struct RateLimit {
    /// Maximum requests per minute
    pub requests_per_minute: u32,
    /// Maximum concurrent requests
    pub max_concurrency: usize,
    /// Minimum delay between consecutive requests
    pub min_delay: Duration,
}

/// An upstream source of historical daily bars.
///
/// Exactly two fetch shapes exist, mirroring the two crawl modes:
///
/// - [`fetch_bulk_for_date`](Self::fetch_bulk_for_date): one call returning
///   every instrument's bar for a single date (the whole exchange).
/// - [`fetch_history`](Self::fetch_history): one call returning a single
///   instrument's bars over a date range.
///
/// Implementations map transport and status failures onto [`ProviderError`]
/// so the crawl loop can classify them; an empty result set is reported as
/// [`ProviderError::NoData`], never as an empty `Ok`.
#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    /// Stable provider identifier (e.g. "EODHD").
    fn id(&self) -> &'static str;

    /// Rate limiting parameters for this provider.
    fn rate_limit(&self) -> RateLimit;

    /// Fetch every instrument's daily bar for one date.
    async fn fetch_bulk_for_date(&self, date: NaiveDate) -> Result<Vec<DailyBar>, ProviderError>;

    /// Fetch one instrument's daily bars for an inclusive date range.
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError>;
}
