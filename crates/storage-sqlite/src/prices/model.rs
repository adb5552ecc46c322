//! Database model for daily price rows.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, parse_date, parse_decimal, parse_timestamp};
use gapfill_core::prices::{PriceRecord, PriceSource};
use gapfill_core::securities::SecurityId;

/// Database model for one (security_id, date) price row.
///
/// Decimals are stored as text to avoid float drift; dates as `%Y-%m-%d`.
#[derive(
    Queryable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
    QueryableByName,
)]
#[diesel(table_name = crate::schema::daily_prices)]
#[diesel(primary_key(security_id, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PriceRecordDB {
    pub security_id: String,
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub adjusted_close: Option<String>,
    pub volume: i64,
    pub source: String,
    pub created_at: String,
}

impl From<&PriceRecord> for PriceRecordDB {
    fn from(record: &PriceRecord) -> Self {
        PriceRecordDB {
            security_id: record.security_id.as_str().to_string(),
            date: format_date(record.date),
            open: record.open.to_string(),
            high: record.high.to_string(),
            low: record.low.to_string(),
            close: record.close.to_string(),
            adjusted_close: record.adjusted_close.map(|d| d.to_string()),
            volume: record.volume,
            source: record.source.to_storage_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl From<PriceRecordDB> for PriceRecord {
    fn from(db: PriceRecordDB) -> Self {
        PriceRecord {
            security_id: SecurityId::new(db.security_id),
            date: parse_date(&db.date),
            open: parse_decimal(&db.open),
            high: parse_decimal(&db.high),
            low: parse_decimal(&db.low),
            close: parse_decimal(&db.close),
            adjusted_close: db.adjusted_close.as_deref().map(parse_decimal),
            volume: db.volume,
            source: PriceSource::from_storage_string(&db.source),
            created_at: parse_timestamp(&db.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_trip_preserves_decimals_and_source() {
        let record = PriceRecord {
            security_id: SecurityId::new("sec-1"),
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            open: dec!(171.06),
            high: dec!(171.24),
            low: dec!(168.68),
            close: dec!(169.12),
            adjusted_close: Some(dec!(168.39)),
            volume: 68_587_700,
            source: PriceSource::Provider("EODHD".to_string()),
            created_at: Utc::now(),
        };

        let db = PriceRecordDB::from(&record);
        assert_eq!(db.date, "2024-03-06");
        assert_eq!(db.close, "169.12");
        assert_eq!(db.source, "EODHD");

        let back = PriceRecord::from(db);
        assert_eq!(back.security_id, record.security_id);
        assert_eq!(back.close, record.close);
        assert_eq!(back.adjusted_close, record.adjusted_close);
        assert_eq!(back.source, record.source);
    }
}
