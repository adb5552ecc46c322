//! Price persistence trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;

use super::model::PriceRecord;
use crate::errors::Result;
use crate::securities::SecurityId;

/// Storage interface for daily price rows.
///
/// Insert operations are keyed by (security_id, date) and conditioned on
/// absence: re-inserting an existing key is a counted no-op, never an error.
/// The one exception is [`bulk_copy`](PriceStore::bulk_copy), which trades
/// that check away for throughput.
#[async_trait]
pub trait PriceStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts the record unless its (security_id, date) key already exists.
    ///
    /// # Returns
    ///
    /// `true` if a row was inserted, `false` if the key was already present.
    async fn insert_if_absent(&self, record: &PriceRecord) -> Result<bool>;

    /// Batch form of [`insert_if_absent`](PriceStore::insert_if_absent).
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted; the remainder already existed.
    async fn insert_batch_if_absent(&self, records: &[PriceRecord]) -> Result<usize>;

    /// High-throughput insert that skips per-row existence checks.
    ///
    /// # Precondition
    ///
    /// The caller must guarantee that none of the (security_id, date) keys
    /// exist in the destination. This is intended for copying a known-empty
    /// range between environments; the precondition is not re-verified, and
    /// violating it surfaces as a unique-constraint error.
    async fn bulk_copy(&self, records: &[PriceRecord]) -> Result<usize>;

    /// Inserts the synthetic holiday row for every security that has a row
    /// on `prior` and none on `holiday` (prior close copied into OHLC,
    /// volume zero, adjusted close preserved).
    ///
    /// # Returns
    ///
    /// The number of rows inserted.
    async fn forward_fill_holiday(&self, holiday: NaiveDate, prior: NaiveDate) -> Result<usize>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Counts rows for one security in `start..=end`.
    fn count_rows(&self, security_id: &SecurityId, start: NaiveDate, end: NaiveDate)
        -> Result<i64>;

    /// Whether a row exists for (security_id, date).
    fn exists(&self, security_id: &SecurityId, date: NaiveDate) -> Result<bool>;

    /// Dates in `start..=end` that have a row for this security.
    fn existing_dates(
        &self,
        security_id: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>>;

    /// Newest stored date for this security, if any.
    fn last_price_date(&self, security_id: &SecurityId) -> Result<Option<NaiveDate>>;

    /// Total rows stored on one date, across all securities.
    fn row_count_on(&self, date: NaiveDate) -> Result<i64>;

    /// Oldest and newest dates with any data, across all securities.
    fn global_date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>>;

    // =========================================================================
    // Script generation
    // =========================================================================

    /// SQL statements that would perform
    /// [`forward_fill_holiday`](PriceStore::forward_fill_holiday), without
    /// executing them. Transaction boundaries are the caller's to add.
    fn forward_fill_statements(&self, holiday: NaiveDate, prior: NaiveDate) -> Vec<String>;
}
