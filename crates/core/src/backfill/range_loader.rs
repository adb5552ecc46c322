//! Bounded-parallel historical loads for explicit ticker lists.
//!
//! The daily crawl is strictly sequential; this loader is the other mode,
//! used when an operator asks for "the full history of these N tickers".
//! Per-ticker fetches fan out over a bounded worker pool and every row goes
//! through the idempotent sync layer, so a rerun after a partial failure
//! only fills what is still missing.
//!
//! The loader does no budget accounting of its own. The scheduler approves
//! and charges the whole cost before dispatch, which keeps the ledger free
//! of cross-worker contention.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::model::UnitError;
use crate::budget::CostModel;
use crate::prices::PriceSource;
use crate::sync::PriceSyncService;
use gapfill_market_data::{ApiEnvironment, PriceDataProvider};

/// Parameters for one explicit range load.
#[derive(Debug, Clone)]
pub struct RangeLoadRequest {
    /// Deployment environment the provider endpoint is resolved from.
    pub environment: ApiEnvironment,
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Parallel fetch workers, clamped to 1..=[`MAX_RANGE_WORKERS`].
    ///
    /// [`MAX_RANGE_WORKERS`]: crate::constants::MAX_RANGE_WORKERS
    pub workers: usize,
    pub cost_model: CostModel,
}

/// Outcome of one range load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeLoadOutcome {
    /// Tickers a fetch was dispatched for.
    pub tickers_dispatched: usize,
    pub records_inserted: u64,
    pub records_skipped: u64,
    /// Credits charged before dispatch. Failed fetches are not refunded.
    pub calls_charged: u32,
    /// Per-ticker failures and no-data results, sorted by ticker.
    pub per_ticker_errors: Vec<UnitError>,
}

/// Fans per-ticker history fetches out over a bounded worker pool.
pub(crate) struct RangeLoader {
    provider: Arc<dyn PriceDataProvider>,
    sync: Arc<PriceSyncService>,
}

impl RangeLoader {
    pub(crate) fn new(provider: Arc<dyn PriceDataProvider>, sync: Arc<PriceSyncService>) -> Self {
        Self { provider, sync }
    }

    /// Loads `start..=end` for every ticker, at most `workers` in flight.
    ///
    /// Infallible by design: each ticker's failure lands in
    /// `per_ticker_errors` and the rest of the batch proceeds.
    pub(crate) async fn load(
        &self,
        tickers: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
        workers: usize,
    ) -> RangeLoadOutcome {
        let source = PriceSource::Provider(self.provider.id().to_string());
        let mut outcome = RangeLoadOutcome {
            tickers_dispatched: tickers.len(),
            ..Default::default()
        };

        let results: Vec<(String, Result<(u64, u64), String>)> = stream::iter(tickers)
            .map(|ticker| {
                let provider = Arc::clone(&self.provider);
                let sync = Arc::clone(&self.sync);
                let source = source.clone();
                async move {
                    let result =
                        load_one(provider.as_ref(), &sync, &source, &ticker, start, end).await;
                    (ticker, result)
                }
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        for (ticker, result) in results {
            match result {
                Ok((inserted, skipped)) => {
                    outcome.records_inserted += inserted;
                    outcome.records_skipped += skipped;
                }
                Err(message) => outcome.per_ticker_errors.push(UnitError {
                    unit: ticker,
                    message,
                }),
            }
        }
        // Workers finish in arbitrary order.
        outcome.per_ticker_errors.sort_by(|a, b| a.unit.cmp(&b.unit));
        outcome
    }
}

async fn load_one(
    provider: &dyn PriceDataProvider,
    sync: &PriceSyncService,
    source: &PriceSource,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(u64, u64), String> {
    let bars = match provider.fetch_history(ticker, start, end).await {
        Ok(bars) => bars,
        Err(err) if err.is_benign() => {
            debug!("Range load: no data for {}", ticker);
            return Err(err.to_string());
        }
        Err(err) => {
            warn!("Range load: fetch failed for {}: {}", ticker, err);
            return Err(err.to_string());
        }
    };

    let report = sync
        .sync_bars(&bars, source)
        .await
        .map_err(|err| err.to_string())?;
    if report.unknown_tickers.iter().any(|t| t == ticker) {
        return Err(format!("no security matches ticker '{}'", ticker));
    }
    Ok((report.inserted as u64, report.skipped as u64))
}
