//! Persistable calendar row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One date of the materialized trading calendar.
///
/// Stored per market so coverage queries can count expected trading days
/// without recomputing holidays in application code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingCalendarEntry {
    pub date: NaiveDate,
    /// Weekday and not an observed holiday.
    pub is_business_day: bool,
    /// Weekday that the market closes for (observed holiday).
    pub is_holiday: bool,
    /// Last calendar day of its month.
    pub is_month_end: bool,
    /// Market the entry is scoped to, e.g. "US".
    pub market: String,
}
