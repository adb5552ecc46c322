//! Database model for trading calendar entries.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, parse_date};
use gapfill_core::calendar::TradingCalendarEntry;

/// Database model for one (date, market) calendar row.
#[derive(
    Queryable, Insertable, Selectable, Debug, Clone, Serialize, Deserialize, PartialEq,
)]
#[diesel(table_name = crate::schema::trading_calendar)]
#[diesel(primary_key(date, market))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntryDB {
    pub date: String,
    pub market: String,
    pub is_business_day: bool,
    pub is_holiday: bool,
    pub is_month_end: bool,
}

impl From<&TradingCalendarEntry> for CalendarEntryDB {
    fn from(entry: &TradingCalendarEntry) -> Self {
        CalendarEntryDB {
            date: format_date(entry.date),
            market: entry.market.clone(),
            is_business_day: entry.is_business_day,
            is_holiday: entry.is_holiday,
            is_month_end: entry.is_month_end,
        }
    }
}

impl From<CalendarEntryDB> for TradingCalendarEntry {
    fn from(db: CalendarEntryDB) -> Self {
        TradingCalendarEntry {
            date: parse_date(&db.date),
            market: db.market,
            is_business_day: db.is_business_day,
            is_holiday: db.is_holiday,
            is_month_end: db.is_month_end,
        }
    }
}
