//! Three-branch gap detection.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use log::debug;
use std::sync::Arc;

use super::model::{GapCandidate, GapKind, GapReport};
use super::ranking::rank_reports;
use super::store::CoverageStore;
use crate::calendar::TradingCalendar;
use crate::constants::{NO_DATA_LOOKBACK_YEARS, STALENESS_THRESHOLD_DAYS};
use crate::errors::Result;
use crate::prices::PriceStore;
use crate::securities::SecurityId;

/// Detects per-security coverage gaps without quadratic cost over the
/// universe.
///
/// Branch 1 (tracked): precise expected-vs-actual trading-day comparison
/// over each security's own date range. Branches 2 and 3 (untracked never
/// loaded, untracked stale) work off two aggregate queries and a shared
/// window computation, so tens of thousands of untracked securities never
/// trigger per-security calendar math.
///
/// Detection is idempotent: unchanged store state yields an identical,
/// identically ordered report set.
pub struct GapDetector {
    calendar: Arc<TradingCalendar>,
    coverage: Arc<dyn CoverageStore>,
    prices: Arc<dyn PriceStore>,
}

impl GapDetector {
    pub fn new(
        calendar: Arc<TradingCalendar>,
        coverage: Arc<dyn CoverageStore>,
        prices: Arc<dyn PriceStore>,
    ) -> Self {
        Self {
            calendar,
            coverage,
            prices,
        }
    }

    /// Ranked gap reports for a market, as of today.
    pub fn analyze_gaps(
        &self,
        market: &str,
        limit: usize,
        include_untracked: bool,
    ) -> Result<Vec<GapReport>> {
        self.analyze_gaps_as_of(market, limit, include_untracked, Utc::now().date_naive())
    }

    /// Ranked gap reports with an explicit "today", newest work first.
    pub fn analyze_gaps_as_of(
        &self,
        market: &str,
        limit: usize,
        include_untracked: bool,
        today: NaiveDate,
    ) -> Result<Vec<GapReport>> {
        let mut reports = Vec::new();

        let tracked = self.coverage.tracked_candidates(market, limit)?;
        debug!("Gap analysis: {} tracked candidates ({})", tracked.len(), market);
        for candidate in &tracked {
            if let Some(report) = self.tracked_report(candidate, today) {
                reports.push(report);
            }
        }

        if include_untracked {
            let no_data = self.coverage.untracked_no_data(market, limit)?;
            let stale = self
                .coverage
                .untracked_stale(market, STALENESS_THRESHOLD_DAYS, limit)?;
            debug!(
                "Gap analysis: {} never-loaded, {} stale untracked candidates ({})",
                no_data.len(),
                stale.len(),
                market
            );

            for candidate in &no_data {
                reports.push(self.never_loaded_report(candidate, today));
            }
            for candidate in &stale {
                if let Some(report) = stale_report(candidate, today) {
                    reports.push(report);
                }
            }
        }

        rank_reports(&mut reports);
        reports.truncate(limit);
        Ok(reports)
    }

    /// Exact missing trading days for one security's window, newest first.
    pub fn missing_dates(
        &self,
        security_id: &SecurityId,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let existing = self.prices.existing_dates(security_id, first, last)?;
        let mut missing: Vec<NaiveDate> = self
            .calendar
            .trading_days_between(first, last)
            .into_iter()
            .filter(|day| !existing.contains(day))
            .collect();
        missing.reverse();
        Ok(missing)
    }

    /// Branch 1: expected vs. actual over the security's own range.
    fn tracked_report(&self, candidate: &GapCandidate, today: NaiveDate) -> Option<GapReport> {
        let (first, last) = match (candidate.first_date, candidate.last_date) {
            (Some(first), Some(last)) => (first, last.min(today)),
            // Tracked but never loaded: fall through to the lookback window.
            _ => return Some(self.never_loaded_report(candidate, today)),
        };

        let expected = self.calendar.count_trading_days(first, last);
        if expected <= candidate.actual_count {
            return None;
        }

        Some(GapReport::from_candidate(
            candidate,
            GapKind::Incomplete,
            first,
            last,
            expected,
            candidate.actual_count,
        ))
    }

    /// Branch 2: the whole lookback window counts as missing.
    fn never_loaded_report(&self, candidate: &GapCandidate, today: NaiveDate) -> GapReport {
        let start = lookback_start(today);
        let expected = self.calendar.count_trading_days(start, today);
        GapReport::from_candidate(candidate, GapKind::NeverLoaded, start, today, expected, 0)
    }
}

/// Branch 3: calendar days since the last price, a deliberately cheap
/// approximation that avoids per-security calendar math.
fn stale_report(candidate: &GapCandidate, today: NaiveDate) -> Option<GapReport> {
    let last_price = candidate.last_date?;
    let missing = (today - last_price).num_days();
    if missing <= 0 {
        return None;
    }

    Some(GapReport::from_candidate(
        candidate,
        GapKind::Stale,
        last_price + Duration::days(1),
        today,
        missing,
        0,
    ))
}

fn lookback_start(today: NaiveDate) -> NaiveDate {
    today
        .with_year(today.year() - NO_DATA_LOOKBACK_YEARS)
        // February 29th with no counterpart two years back.
        .unwrap_or(today - Duration::days(365 * NO_DATA_LOOKBACK_YEARS as i64))
}
