//! Calendar persistence trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::TradingCalendarEntry;
use crate::errors::Result;

/// Storage interface for the materialized trading calendar.
///
/// The calendar is computed in-process ([`super::TradingCalendar`]) and
/// persisted so coverage queries can count expected trading days in SQL
/// instead of round-tripping per security.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Replaces the stored entries covering the entries' date span.
    ///
    /// # Returns
    ///
    /// The number of entries written.
    async fn replace_entries(&self, entries: Vec<TradingCalendarEntry>) -> Result<usize>;

    /// Counts business days in `start..=end` (inclusive).
    fn count_business_days(&self, start: NaiveDate, end: NaiveDate) -> Result<i64>;

    /// Observed weekday holidays in `start..=end`, ascending.
    fn holidays_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>>;
}
