//! SQLite-backed trading calendar repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::trading_calendar::dsl::*;
use crate::utils::{format_date, parse_date};
use gapfill_core::calendar::{CalendarStore, TradingCalendarEntry};
use gapfill_core::errors::Result;

use super::model::CalendarEntryDB;

/// Calendar persistence scoped to one market.
pub struct CalendarRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    market_code: String,
}

impl CalendarRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self::for_market(pool, writer, "US")
    }

    pub fn for_market(pool: Arc<DbPool>, writer: WriteHandle, market_code: &str) -> Self {
        Self {
            pool,
            writer,
            market_code: market_code.to_string(),
        }
    }
}

#[async_trait]
impl CalendarStore for CalendarRepository {
    async fn replace_entries(&self, entries: Vec<TradingCalendarEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        let span_start = format_date(entries.iter().map(|e| e.date).min().unwrap_or_default());
        let span_end = format_date(entries.iter().map(|e| e.date).max().unwrap_or_default());
        let scope = self.market_code.clone();
        let rows: Vec<CalendarEntryDB> = entries.iter().map(CalendarEntryDB::from).collect();

        let written = self
            .writer
            .exec(move |conn| {
                diesel::delete(
                    trading_calendar
                        .filter(market.eq(&scope))
                        .filter(date.ge(&span_start))
                        .filter(date.le(&span_end)),
                )
                .execute(conn)?;

                let mut total = 0usize;
                // 5 bound params per row; stay under the sqlite limit.
                for chunk in rows.chunks(100) {
                    total += diesel::insert_into(trading_calendar)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(total)
            })
            .await?;
        Ok(written)
    }

    fn count_business_days(&self, start: NaiveDate, end: NaiveDate) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        trading_calendar
            .filter(market.eq(&self.market_code))
            .filter(is_business_day.eq(true))
            .filter(date.ge(format_date(start)))
            .filter(date.le(format_date(end)))
            .select(count_star())
            .first::<i64>(&mut conn)
            .into_core()
    }

    fn holidays_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<String> = trading_calendar
            .filter(market.eq(&self.market_code))
            .filter(is_holiday.eq(true))
            .filter(date.ge(format_date(start)))
            .filter(date.le(format_date(end)))
            .select(date)
            .order(date.asc())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.iter().map(|d| parse_date(d)).collect())
    }
}
