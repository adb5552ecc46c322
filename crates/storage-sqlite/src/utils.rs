//! Helpers shared by the repositories.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maximum number of parameters bound into one `IN (...)` clause.
///
/// SQLite caps bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// typically 999). 500 leaves headroom for the query's other binds; any
/// query taking an unbounded id or ticker list goes through
/// [`chunk_for_sqlite`].
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into `IN`-clause-sized chunks.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Storage format for date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a stored `%Y-%m-%d` column, tolerating a trailing time part.
/// Falls back to the epoch date.
pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), DATE_FORMAT).unwrap_or_default()
}

/// Parses a stored RFC 3339 timestamp, falling back to now.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parses a stored decimal column, falling back to zero.
pub fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_sqlite_splits_large_lists() {
        let items: Vec<i32> = (0..1201).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[2].len(), 201);

        let empty: Vec<i32> = Vec::new();
        assert_eq!(chunk_for_sqlite(&empty).count(), 0);
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(parse_date(&format_date(date)), date);
        assert_eq!(parse_date("2024-03-06 00:00:00"), date);
        assert_eq!(parse_date("junk"), NaiveDate::default());
    }
}
