//! Idempotent sync layer between provider bars and the price store.
//!
//! Everything here is safe to repeat: security upserts preserve identity,
//! and price inserts are keyed by (security_id, date) with existence checks,
//! so re-syncing the same bars is a counted no-op. The only exception is
//! [`PriceSyncService::bulk_copy`], whose disjointness precondition the
//! caller carries.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::errors::Result;
use crate::prices::{PriceRecord, PriceSource, PriceStore};
use crate::securities::{Security, SecurityId, SecurityStore};
use gapfill_market_data::DailyBar;

/// Outcome counters for one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Rows actually written.
    pub inserted: usize,
    /// Rows whose (security_id, date) key already existed.
    pub skipped: usize,
    /// Distinct bar tickers with no matching security, dropped.
    pub unknown_tickers: Vec<String>,
}

/// Persists provider bars and securities idempotently.
pub struct PriceSyncService {
    securities: Arc<dyn SecurityStore>,
    prices: Arc<dyn PriceStore>,
}

impl PriceSyncService {
    pub fn new(securities: Arc<dyn SecurityStore>, prices: Arc<dyn PriceStore>) -> Self {
        Self { securities, prices }
    }

    /// Inserts or updates a security, preserving its externally assigned id.
    pub async fn upsert_security(&self, security: &Security) -> Result<Security> {
        debug!("Upserting security {} ({})", security.ticker, security.id);
        self.securities.upsert(security).await
    }

    /// Maps bars onto stored securities and inserts the missing rows.
    ///
    /// Bars whose ticker resolves to no security are skipped and reported,
    /// never treated as an error; a bulk feed routinely carries instruments
    /// outside the universe.
    pub async fn sync_bars(&self, bars: &[DailyBar], source: &PriceSource) -> Result<SyncReport> {
        if bars.is_empty() {
            return Ok(SyncReport::default());
        }

        let tickers: Vec<String> = bars
            .iter()
            .map(|bar| bar.ticker.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let ids: HashMap<String, SecurityId> = self.securities.ids_for_tickers(&tickers)?;

        let mut unknown = BTreeSet::new();
        let mut records = Vec::with_capacity(bars.len());
        for bar in bars {
            match ids.get(&bar.ticker) {
                Some(id) => records.push(PriceRecord::from_bar(id.clone(), bar, source.clone())),
                None => {
                    unknown.insert(bar.ticker.clone());
                }
            }
        }

        let inserted = self.prices.insert_batch_if_absent(&records).await?;
        let report = SyncReport {
            inserted,
            skipped: records.len() - inserted,
            unknown_tickers: unknown.into_iter().collect(),
        };

        debug!(
            "Synced {} bars: {} inserted, {} skipped, {} unknown tickers",
            bars.len(),
            report.inserted,
            report.skipped,
            report.unknown_tickers.len()
        );
        Ok(report)
    }

    /// High-throughput copy without per-row existence checks.
    ///
    /// # Precondition
    ///
    /// The destination must hold none of the records' (security_id, date)
    /// keys. See [`PriceStore::bulk_copy`]; the check is not repeated here.
    pub async fn bulk_copy(&self, records: &[PriceRecord]) -> Result<usize> {
        let copied = self.prices.bulk_copy(records).await?;
        info!("Bulk-copied {} price rows", copied);
        Ok(copied)
    }
}
