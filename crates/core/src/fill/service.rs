//! Holiday forward-fill over the stored price history.
//!
//! Downstream consumers expect a bar for every business day a security was
//! listed, holidays included. The filler finds weekday holidays inside the
//! stored date range that have no rows at all and copies the previous
//! trading day's close into a flat zero-volume bar for every security priced
//! on that prior day. Adjusted closes carry over unchanged.
//!
//! Fills are insert-if-absent, so re-running the filler never duplicates or
//! overwrites rows. A dry run renders the SQL it would execute instead of
//! touching the store.

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calendar::TradingCalendar;
use crate::errors::Result;
use crate::prices::PriceStore;

/// A holiday with no price rows whose prior trading day has some.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHoliday {
    /// The unpriced market holiday.
    pub holiday: NaiveDate,
    /// Trading day whose closes get copied.
    pub source_day: NaiveDate,
}

/// Knobs for a single fill invocation.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Cap on the number of holidays handled this invocation.
    pub limit: Option<usize>,
    /// Render SQL instead of executing it.
    pub dry_run: bool,
}

/// What one invocation did (or, dry-run, would do).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    /// Holidays handled this invocation.
    pub holidays_processed: usize,
    /// Price rows written. Always zero on a dry run.
    pub records_inserted: usize,
    /// Pending holidays left for a later invocation.
    pub remaining_days: usize,
    /// Rendered SQL script, dry runs only.
    pub script: Option<String>,
}

/// Copies prior-close bars onto unpriced market holidays.
pub struct HolidayForwardFiller {
    calendar: Arc<TradingCalendar>,
    prices: Arc<dyn PriceStore>,
}

impl HolidayForwardFiller {
    pub fn new(calendar: Arc<TradingCalendar>, prices: Arc<dyn PriceStore>) -> Self {
        Self { calendar, prices }
    }

    /// Holidays inside the stored date range still needing a fill, ascending.
    ///
    /// A holiday qualifies when it has zero rows and its previous trading
    /// day has at least one. Holidays before any stored data resolve to a
    /// rowless prior day and drop out on their own.
    pub fn pending(&self) -> Result<Vec<PendingHoliday>> {
        let Some((start, end)) = self.prices.global_date_bounds()? else {
            return Ok(Vec::new());
        };

        let mut pending = Vec::new();
        for holiday in self.calendar.holidays_between(start, end) {
            if self.prices.row_count_on(holiday)? > 0 {
                continue;
            }
            let source_day = self.calendar.previous_trading_day(holiday);
            if self.prices.row_count_on(source_day)? == 0 {
                continue;
            }
            pending.push(PendingHoliday {
                holiday,
                source_day,
            });
        }
        Ok(pending)
    }

    /// Fills pending holidays up to `options.limit`, oldest first.
    pub async fn run(&self, options: &FillOptions) -> Result<FillOutcome> {
        let pending = self.pending()?;
        let take = options.limit.unwrap_or(pending.len()).min(pending.len());
        let (batch, deferred) = pending.split_at(take);

        if options.dry_run {
            return Ok(FillOutcome {
                holidays_processed: batch.len(),
                records_inserted: 0,
                remaining_days: deferred.len(),
                script: Some(self.render_script(batch)),
            });
        }

        let mut records_inserted = 0;
        for item in batch {
            let inserted = self
                .prices
                .forward_fill_holiday(item.holiday, item.source_day)
                .await?;
            debug!(
                "Forward-filled {} rows onto {} from {}",
                inserted, item.holiday, item.source_day
            );
            records_inserted += inserted;
        }

        info!(
            "Holiday fill: {} holidays, {} rows inserted, {} pending",
            batch.len(),
            records_inserted,
            deferred.len()
        );
        Ok(FillOutcome {
            holidays_processed: batch.len(),
            records_inserted,
            remaining_days: deferred.len(),
            script: None,
        })
    }

    /// One reviewable script for the whole batch, wrapped in a transaction
    /// so it applies all-or-nothing when pasted into a SQL shell.
    fn render_script(&self, batch: &[PendingHoliday]) -> String {
        let mut script = String::from("BEGIN TRANSACTION;\n");
        for item in batch {
            script.push_str(&format!(
                "\n-- {} forward-filled from {}\n",
                item.holiday, item.source_day
            ));
            for statement in self
                .prices
                .forward_fill_statements(item.holiday, item.source_day)
            {
                script.push_str(&statement);
                if !statement.ends_with('\n') {
                    script.push('\n');
                }
            }
        }
        script.push_str("\nCOMMIT;\n");
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PriceRecord;
    use crate::securities::SecurityId;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Store stub tracking per-date row counts; a fill copies the source
    /// day's count onto the holiday.
    struct FillStore {
        bounds: Option<(NaiveDate, NaiveDate)>,
        rows_by_date: Mutex<HashMap<NaiveDate, i64>>,
        fills: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    impl FillStore {
        fn new(bounds: Option<(NaiveDate, NaiveDate)>, seeded: &[(NaiveDate, i64)]) -> Self {
            Self {
                bounds,
                rows_by_date: Mutex::new(seeded.iter().copied().collect()),
                fills: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PriceStore for FillStore {
        async fn insert_if_absent(&self, _: &PriceRecord) -> Result<bool> {
            unreachable!("not used by the filler")
        }

        async fn insert_batch_if_absent(&self, _: &[PriceRecord]) -> Result<usize> {
            unreachable!("not used by the filler")
        }

        async fn bulk_copy(&self, _: &[PriceRecord]) -> Result<usize> {
            unreachable!("not used by the filler")
        }

        async fn forward_fill_holiday(&self, holiday: NaiveDate, prior: NaiveDate) -> Result<usize> {
            let mut rows = self.rows_by_date.lock().unwrap();
            let copied = *rows.get(&prior).unwrap_or(&0);
            rows.insert(holiday, copied);
            self.fills.lock().unwrap().push((holiday, prior));
            Ok(copied as usize)
        }

        fn count_rows(&self, _: &SecurityId, _: NaiveDate, _: NaiveDate) -> Result<i64> {
            Ok(0)
        }

        fn exists(&self, _: &SecurityId, _: NaiveDate) -> Result<bool> {
            Ok(false)
        }

        fn existing_dates(
            &self,
            _: &SecurityId,
            _: NaiveDate,
            _: NaiveDate,
        ) -> Result<HashSet<NaiveDate>> {
            Ok(HashSet::new())
        }

        fn last_price_date(&self, _: &SecurityId) -> Result<Option<NaiveDate>> {
            Ok(None)
        }

        fn row_count_on(&self, date: NaiveDate) -> Result<i64> {
            Ok(*self.rows_by_date.lock().unwrap().get(&date).unwrap_or(&0))
        }

        fn global_date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
            Ok(self.bounds)
        }

        fn forward_fill_statements(&self, holiday: NaiveDate, prior: NaiveDate) -> Vec<String> {
            vec![format!(
                "INSERT INTO daily_prices SELECT security_id, '{}', close FROM daily_prices WHERE date = '{}';",
                holiday, prior
            )]
        }
    }

    /// First half of 2024 with every holiday's prior trading day priced.
    fn half_2024_store() -> Arc<FillStore> {
        Arc::new(FillStore::new(
            Some((date(2024, 1, 2), date(2024, 7, 10))),
            &[
                (date(2024, 1, 12), 100), // before MLK Day
                (date(2024, 2, 16), 100), // before Presidents Day
                (date(2024, 3, 28), 100), // before Good Friday
                (date(2024, 5, 24), 100), // before Memorial Day
                (date(2024, 6, 18), 100), // before Juneteenth
                (date(2024, 7, 3), 100),  // before Independence Day
            ],
        ))
    }

    fn filler(store: Arc<FillStore>) -> HolidayForwardFiller {
        HolidayForwardFiller::new(Arc::new(TradingCalendar::new()), store)
    }

    #[test]
    fn test_pending_lists_unpriced_holidays_ascending() {
        let filler = filler(half_2024_store());
        let pending = filler.pending().unwrap();
        assert_eq!(
            pending.iter().map(|p| p.holiday).collect::<Vec<_>>(),
            vec![
                date(2024, 1, 15),
                date(2024, 2, 19),
                date(2024, 3, 29),
                date(2024, 5, 27),
                date(2024, 6, 19),
                date(2024, 7, 4),
            ]
        );
        assert_eq!(pending[0].source_day, date(2024, 1, 12));
    }

    #[test]
    fn test_pending_skips_holiday_with_unpriced_source_day() {
        let store = Arc::new(FillStore::new(
            Some((date(2024, 1, 2), date(2024, 1, 31))),
            // Nothing on January 12th, so MLK Day has nothing to copy.
            &[(date(2024, 1, 16), 100)],
        ));
        assert!(filler(store).pending().unwrap().is_empty());
    }

    #[test]
    fn test_pending_empty_store() {
        let store = Arc::new(FillStore::new(None, &[]));
        assert!(filler(store).pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_honors_limit_and_reports_remainder() {
        let store = half_2024_store();
        let filler = filler(store.clone());

        let outcome = filler
            .run(&FillOptions {
                limit: Some(2),
                dry_run: false,
            })
            .await
            .unwrap();
        assert_eq!(outcome.holidays_processed, 2);
        assert_eq!(outcome.records_inserted, 200);
        assert_eq!(outcome.remaining_days, 4);
        assert!(outcome.script.is_none());

        assert_eq!(
            *store.fills.lock().unwrap(),
            vec![
                (date(2024, 1, 15), date(2024, 1, 12)),
                (date(2024, 2, 19), date(2024, 2, 16)),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_twice_is_idempotent() {
        let store = half_2024_store();
        let filler = filler(store.clone());

        let first = filler.run(&FillOptions::default()).await.unwrap();
        assert_eq!(first.holidays_processed, 6);
        assert_eq!(first.records_inserted, 600);
        assert_eq!(first.remaining_days, 0);

        let second = filler.run(&FillOptions::default()).await.unwrap();
        assert_eq!(second.holidays_processed, 0);
        assert_eq!(second.records_inserted, 0);
        assert_eq!(store.fills.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_dry_run_renders_script_without_writing() {
        let store = half_2024_store();
        let filler = filler(store.clone());

        let outcome = filler
            .run(&FillOptions {
                limit: Some(1),
                dry_run: true,
            })
            .await
            .unwrap();
        assert_eq!(outcome.holidays_processed, 1);
        assert_eq!(outcome.records_inserted, 0);
        assert_eq!(outcome.remaining_days, 5);
        assert!(store.fills.lock().unwrap().is_empty());

        let script = outcome.script.unwrap();
        assert!(script.starts_with("BEGIN TRANSACTION;\n"));
        assert!(script.ends_with("COMMIT;\n"));
        assert!(script.contains("-- 2024-01-15 forward-filled from 2024-01-12"));
        assert!(script.contains("WHERE date = '2024-01-12'"));
        assert!(!script.contains("2024-02-19"));
    }
}
