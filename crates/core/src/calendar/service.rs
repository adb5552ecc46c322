//! Trading-day predicates and range enumeration.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::holidays::holidays_for_year;
use super::model::TradingCalendarEntry;

/// Market code the calendar is scoped to.
const MARKET: &str = "US";

/// US equity trading calendar with a lazily filled per-year holiday cache.
///
/// The cached set for year Y holds every observed closure date that falls
/// within Y. That includes the following year's New Year's Day when it is
/// observed on December 31st.
pub struct TradingCalendar {
    observed_by_year: Mutex<HashMap<i32, Arc<HashSet<NaiveDate>>>>,
}

impl TradingCalendar {
    pub fn new() -> Self {
        Self {
            observed_by_year: Mutex::new(HashMap::new()),
        }
    }

    /// Market code entries are scoped to.
    pub fn market(&self) -> &'static str {
        MARKET
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<i32, Arc<HashSet<NaiveDate>>>> {
        // Recover from poisoning: the cache is only ever inserted into.
        self.observed_by_year
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Observed closure dates falling within `year`.
    fn observed_set(&self, year: i32) -> Arc<HashSet<NaiveDate>> {
        if let Some(set) = self.lock_cache().get(&year) {
            return Arc::clone(set);
        }

        // Pull the adjacent year too: its New Year's Day can be observed in
        // late December of this year.
        let set: HashSet<NaiveDate> = holidays_for_year(year)
            .into_iter()
            .chain(holidays_for_year(year + 1))
            .map(|h| h.observed)
            .filter(|d| d.year() == year)
            .collect();

        let set = Arc::new(set);
        self.lock_cache().insert(year, Arc::clone(&set));
        set
    }

    /// Weekday and not an observed market holiday.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.observed_set(date.year()).contains(&date)
    }

    /// Weekday the market closes for (observed holiday).
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && self.observed_set(date.year()).contains(&date)
    }

    /// Closest trading day strictly before `date`.
    ///
    /// Walks one day at a time; every 7-day window contains a trading day,
    /// so the walk terminates.
    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date - Duration::days(1);
        while !self.is_trading_day(day) {
            day -= Duration::days(1);
        }
        day
    }

    /// Closest trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date + Duration::days(1);
        while !self.is_trading_day(day) {
            day += Duration::days(1);
        }
        day
    }

    /// Trading days in `start..=end`, ascending. Empty when `start > end`.
    pub fn trading_days_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = start;
        while day <= end {
            if self.is_trading_day(day) {
                days.push(day);
            }
            day += Duration::days(1);
        }
        days
    }

    /// Observed market holidays in `start..=end`, ascending.
    pub fn holidays_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = start;
        while day <= end {
            if self.is_holiday(day) {
                days.push(day);
            }
            day += Duration::days(1);
        }
        days
    }

    /// Number of trading days in `start..=end`.
    pub fn count_trading_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut day = start;
        while day <= end {
            if self.is_trading_day(day) {
                count += 1;
            }
            day += Duration::days(1);
        }
        count
    }

    /// Materialize one [`TradingCalendarEntry`] per calendar day in
    /// `start..=end` for persistence.
    pub fn calendar_entries(&self, start: NaiveDate, end: NaiveDate) -> Vec<TradingCalendarEntry> {
        let mut entries = Vec::new();
        let mut day = start;
        while day <= end {
            entries.push(TradingCalendarEntry {
                date: day,
                is_business_day: self.is_trading_day(day),
                is_holiday: self.is_holiday(day),
                is_month_end: is_month_end(day),
                market: MARKET.to_string(),
            });
            day += Duration::days(1);
        }
        entries
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_month_end(date: NaiveDate) -> bool {
    (date + Duration::days(1)).month() != date.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ordinary_weekday_is_trading_day() {
        let calendar = TradingCalendar::new();
        assert!(calendar.is_trading_day(date(2024, 3, 6)));
    }

    #[test]
    fn test_weekends_are_never_trading_days() {
        let calendar = TradingCalendar::new();
        // Every Saturday and Sunday of March 2024.
        for d in [2, 3, 9, 10, 16, 17, 23, 24, 30, 31] {
            assert!(!calendar.is_trading_day(date(2024, 3, d)));
        }
    }

    #[test]
    fn test_holidays_close_the_market() {
        let calendar = TradingCalendar::new();
        assert!(!calendar.is_trading_day(date(2024, 1, 1))); // New Year
        assert!(!calendar.is_trading_day(date(2024, 1, 15))); // MLK
        assert!(!calendar.is_trading_day(date(2024, 3, 29))); // Good Friday
        assert!(!calendar.is_trading_day(date(2024, 7, 4)));
        assert!(!calendar.is_trading_day(date(2024, 12, 25)));

        assert!(calendar.is_holiday(date(2024, 7, 4)));
        assert!(!calendar.is_holiday(date(2024, 7, 6))); // Saturday, not a holiday
    }

    #[test]
    fn test_observed_closure_crosses_year_boundary() {
        let calendar = TradingCalendar::new();
        // January 1st 2022 (Saturday) is observed Friday December 31st 2021.
        assert!(!calendar.is_trading_day(date(2021, 12, 31)));
        assert!(calendar.is_holiday(date(2021, 12, 31)));
        // The Saturday itself stays a plain weekend.
        assert!(!calendar.is_holiday(date(2022, 1, 1)));
    }

    #[test]
    fn test_sunday_holiday_observed_monday() {
        let calendar = TradingCalendar::new();
        // July 4th 2021 is a Sunday; Monday July 5th closes instead.
        assert!(!calendar.is_trading_day(date(2021, 7, 5)));
    }

    #[test]
    fn test_previous_next_walk_over_weekend_and_holiday() {
        let calendar = TradingCalendar::new();
        // MLK Monday 2024-01-15: walking back from Tuesday lands on Friday.
        assert_eq!(
            calendar.previous_trading_day(date(2024, 1, 16)),
            date(2024, 1, 12)
        );
        assert_eq!(
            calendar.next_trading_day(date(2024, 1, 12)),
            date(2024, 1, 16)
        );
    }

    #[test]
    fn test_previous_next_bracket_the_input() {
        let calendar = TradingCalendar::new();
        for offset in 0..30 {
            let d = date(2024, 6, 1) + Duration::days(offset);
            assert!(calendar.previous_trading_day(d) < d);
            assert!(calendar.next_trading_day(d) > d);
        }
    }

    #[test]
    fn test_january_2024_trading_day_count() {
        let calendar = TradingCalendar::new();
        // 23 weekdays minus New Year's Day and MLK Day.
        assert_eq!(
            calendar.count_trading_days(date(2024, 1, 1), date(2024, 1, 31)),
            21
        );
        assert_eq!(
            calendar
                .trading_days_between(date(2024, 1, 1), date(2024, 1, 31))
                .len(),
            21
        );
    }

    #[test]
    fn test_holidays_between_lists_observed_closures() {
        let calendar = TradingCalendar::new();
        assert_eq!(
            calendar.holidays_between(date(2024, 1, 1), date(2024, 3, 31)),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 2, 19), date(2024, 3, 29)]
        );
    }

    #[test]
    fn test_trading_days_between_empty_on_inverted_range() {
        let calendar = TradingCalendar::new();
        assert!(calendar
            .trading_days_between(date(2024, 2, 1), date(2024, 1, 1))
            .is_empty());
    }

    #[test]
    fn test_calendar_entries_flags() {
        let calendar = TradingCalendar::new();
        let entries = calendar.calendar_entries(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(entries.len(), 31);

        let jan1 = &entries[0];
        assert!(!jan1.is_business_day);
        assert!(jan1.is_holiday);
        assert!(!jan1.is_month_end);
        assert_eq!(jan1.market, "US");

        let jan31 = &entries[30];
        assert!(jan31.is_business_day);
        assert!(jan31.is_month_end);

        let jan6 = &entries[5]; // Saturday
        assert!(!jan6.is_business_day);
        assert!(!jan6.is_holiday);
    }

    #[test]
    fn test_year_cache_is_reused() {
        let calendar = TradingCalendar::new();
        calendar.is_trading_day(date(2024, 3, 6));
        calendar.is_trading_day(date(2024, 7, 4));
        assert_eq!(calendar.lock_cache().len(), 1);

        calendar.is_trading_day(date(2025, 3, 6));
        assert_eq!(calendar.lock_cache().len(), 2);
    }
}
