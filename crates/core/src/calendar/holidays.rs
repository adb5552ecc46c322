//! US market holiday computation.
//!
//! Fixed-date holidays: New Year's Day, Juneteenth (federal holiday since
//! 2021), Independence Day, Christmas Day. Floating holidays: MLK Day (3rd
//! Monday of January), Presidents' Day (3rd Monday of February), Good Friday
//! (Easter minus two days), Memorial Day (last Monday of May), Labor Day
//! (1st Monday of September), Thanksgiving (4th Thursday of November).
//!
//! Every holiday carries an observed date: a Saturday holiday is observed
//! the preceding Friday, a Sunday holiday the following Monday. The market
//! closes on the observed date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// First year Juneteenth was observed as a market holiday.
const JUNETEENTH_FIRST_YEAR: i32 = 2021;

/// A market holiday of a given year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    /// Nominal date of the holiday.
    pub date: NaiveDate,
    /// Date the market actually closes (weekend-shifted).
    pub observed: NaiveDate,
}

impl Holiday {
    fn new(name: &'static str, date: NaiveDate) -> Self {
        Self {
            name,
            date,
            observed: observed_date(date),
        }
    }
}

/// Shift a weekend holiday to the adjacent weekday.
fn observed_date(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Easter Sunday of a year, via the anonymous Gregorian computus.
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    // The computus always yields a valid March or April date.
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 4, 1).expect("valid date"))
}

/// Nth occurrence of a weekday within a month (n is 1-based).
fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first of month");
    let offset = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    first + Duration::days(offset + 7 * (n as i64 - 1))
}

/// Last occurrence of a weekday within a month.
fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_month.expect("valid first of month") - Duration::days(1);
    let offset = (7 + last.weekday().num_days_from_monday() as i64
        - weekday.num_days_from_monday() as i64)
        % 7;
    last - Duration::days(offset)
}

/// All market holidays of a year, in chronological order of nominal date.
///
/// Observed dates can leave the year at its edges (a Saturday January 1st
/// is observed the previous December 31st).
pub fn holidays_for_year(year: i32) -> Vec<Holiday> {
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d).expect("valid holiday date");

    let mut holidays = vec![
        Holiday::new("New Year's Day", ymd(1, 1)),
        Holiday::new(
            "Martin Luther King Jr. Day",
            nth_weekday_of_month(year, 1, Weekday::Mon, 3),
        ),
        Holiday::new(
            "Presidents' Day",
            nth_weekday_of_month(year, 2, Weekday::Mon, 3),
        ),
        Holiday::new("Good Friday", easter_sunday(year) - Duration::days(2)),
        Holiday::new("Memorial Day", last_weekday_of_month(year, 5, Weekday::Mon)),
        Holiday::new("Independence Day", ymd(7, 4)),
        Holiday::new("Labor Day", nth_weekday_of_month(year, 9, Weekday::Mon, 1)),
        Holiday::new(
            "Thanksgiving",
            nth_weekday_of_month(year, 11, Weekday::Thu, 4),
        ),
        Holiday::new("Christmas Day", ymd(12, 25)),
    ];

    if year >= JUNETEENTH_FIRST_YEAR {
        holidays.push(Holiday::new("Juneteenth", ymd(6, 19)));
    }

    holidays.sort_by_key(|h| h.date);
    holidays
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_easter_known_dates() {
        assert_eq!(easter_sunday(2021), date(2021, 4, 4));
        assert_eq!(easter_sunday(2023), date(2023, 4, 9));
        assert_eq!(easter_sunday(2024), date(2024, 3, 31));
        assert_eq!(easter_sunday(2025), date(2025, 4, 20));
    }

    #[test]
    fn test_good_friday_2024() {
        let holidays = holidays_for_year(2024);
        let good_friday = holidays.iter().find(|h| h.name == "Good Friday").unwrap();
        assert_eq!(good_friday.date, date(2024, 3, 29));
        assert_eq!(good_friday.observed, date(2024, 3, 29));
    }

    #[test]
    fn test_floating_holidays_2024() {
        let holidays = holidays_for_year(2024);
        let by_name = |name: &str| holidays.iter().find(|h| h.name == name).unwrap().date;

        assert_eq!(by_name("Martin Luther King Jr. Day"), date(2024, 1, 15));
        assert_eq!(by_name("Presidents' Day"), date(2024, 2, 19));
        assert_eq!(by_name("Memorial Day"), date(2024, 5, 27));
        assert_eq!(by_name("Labor Day"), date(2024, 9, 2));
        assert_eq!(by_name("Thanksgiving"), date(2024, 11, 28));
    }

    #[test]
    fn test_juneteenth_starts_2021() {
        assert!(!holidays_for_year(2020)
            .iter()
            .any(|h| h.name == "Juneteenth"));
        assert!(holidays_for_year(2021).iter().any(|h| h.name == "Juneteenth"));
        assert_eq!(
            holidays_for_year(2020).len() + 1,
            holidays_for_year(2021).len()
        );
    }

    #[test]
    fn test_weekend_observation_shifts() {
        // July 4th 2021 is a Sunday, observed Monday July 5th.
        let independence = holidays_for_year(2021)
            .into_iter()
            .find(|h| h.name == "Independence Day")
            .unwrap();
        assert_eq!(independence.observed, date(2021, 7, 5));

        // Christmas 2021 is a Saturday, observed Friday December 24th.
        let christmas = holidays_for_year(2021)
            .into_iter()
            .find(|h| h.name == "Christmas Day")
            .unwrap();
        assert_eq!(christmas.observed, date(2021, 12, 24));

        // January 1st 2022 is a Saturday, observed December 31st 2021.
        let new_year = holidays_for_year(2022)
            .into_iter()
            .find(|h| h.name == "New Year's Day")
            .unwrap();
        assert_eq!(new_year.observed, date(2021, 12, 31));
    }

    #[test]
    fn test_no_duplicate_dates_in_a_year() {
        for year in 1990..=2050 {
            let holidays = holidays_for_year(year);
            let dates: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();
            assert_eq!(dates.len(), holidays.len(), "duplicate in {}", year);
        }
    }

    #[test]
    fn test_nth_weekday_helper() {
        // January 2024 starts on a Monday.
        assert_eq!(
            nth_weekday_of_month(2024, 1, Weekday::Mon, 1),
            date(2024, 1, 1)
        );
        assert_eq!(
            nth_weekday_of_month(2024, 1, Weekday::Mon, 3),
            date(2024, 1, 15)
        );
        assert_eq!(last_weekday_of_month(2024, 5, Weekday::Mon), date(2024, 5, 27));
        assert_eq!(last_weekday_of_month(2023, 12, Weekday::Fri), date(2023, 12, 29));
    }
}
