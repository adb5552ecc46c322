//! SQLite-backed price repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::daily_prices::dsl::*;
use crate::utils::{format_date, parse_date};
use gapfill_core::errors::Result;
use gapfill_core::prices::{PriceRecord, PriceStore, SOURCE_FORWARD_FILL};
use gapfill_core::securities::SecurityId;

use super::model::PriceRecordDB;

/// Price persistence over the shared pool and serialized writer.
pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Forward-fill insert with `?` placeholders for (holiday, created_at,
/// prior, holiday), in bind order.
const FORWARD_FILL_SQL: &str = "\
INSERT INTO daily_prices \
(security_id, date, open, high, low, close, adjusted_close, volume, source, created_at) \
SELECT p.security_id, ?, p.close, p.close, p.close, p.close, p.adjusted_close, 0, 'FORWARD_FILL', ? \
FROM daily_prices p \
WHERE p.date = ? \
AND NOT EXISTS (\
SELECT 1 FROM daily_prices q \
WHERE q.security_id = p.security_id AND q.date = ?\
)";

#[async_trait]
impl PriceStore for PriceRepository {
    async fn insert_if_absent(&self, record: &PriceRecord) -> Result<bool> {
        let row = PriceRecordDB::from(record);
        let inserted = self
            .writer
            .exec(move |conn| {
                let n = diesel::insert_or_ignore_into(daily_prices)
                    .values(&row)
                    .execute(conn)?;
                Ok(n)
            })
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_batch_if_absent(&self, records: &[PriceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<PriceRecordDB> = records.iter().map(PriceRecordDB::from).collect();
        let inserted = self
            .writer
            .exec(move |conn| {
                let mut total = 0usize;
                // 10 bound params per row; stay under the sqlite limit.
                for chunk in rows.chunks(50) {
                    total += diesel::insert_or_ignore_into(daily_prices)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(total)
            })
            .await?;
        Ok(inserted)
    }

    async fn bulk_copy(&self, records: &[PriceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<PriceRecordDB> = records.iter().map(PriceRecordDB::from).collect();
        let inserted = self
            .writer
            .exec(move |conn| {
                let mut total = 0usize;
                for chunk in rows.chunks(50) {
                    total += diesel::insert_into(daily_prices)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(total)
            })
            .await?;
        Ok(inserted)
    }

    async fn forward_fill_holiday(&self, holiday: NaiveDate, prior: NaiveDate) -> Result<usize> {
        let holiday_str = format_date(holiday);
        let prior_str = format_date(prior);
        let inserted = self
            .writer
            .exec(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let n = diesel::sql_query(FORWARD_FILL_SQL)
                    .bind::<Text, _>(&holiday_str)
                    .bind::<Text, _>(&now)
                    .bind::<Text, _>(&prior_str)
                    .bind::<Text, _>(&holiday_str)
                    .execute(conn)?;
                Ok(n)
            })
            .await?;
        Ok(inserted)
    }

    fn count_rows(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        daily_prices
            .filter(security_id.eq(security.as_str()))
            .filter(date.ge(format_date(start)))
            .filter(date.le(format_date(end)))
            .select(count_star())
            .first::<i64>(&mut conn)
            .into_core()
    }

    fn exists(&self, security: &SecurityId, day: NaiveDate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let found = daily_prices
            .filter(security_id.eq(security.as_str()))
            .filter(date.eq(format_date(day)))
            .select(date)
            .first::<String>(&mut conn)
            .optional()
            .into_core()?;
        Ok(found.is_some())
    }

    fn existing_dates(
        &self,
        security: &SecurityId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<String> = daily_prices
            .filter(security_id.eq(security.as_str()))
            .filter(date.ge(format_date(start)))
            .filter(date.le(format_date(end)))
            .select(date)
            .load(&mut conn)
            .into_core()?;
        Ok(rows.iter().map(|d| parse_date(d)).collect())
    }

    fn last_price_date(&self, security: &SecurityId) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let newest = daily_prices
            .filter(security_id.eq(security.as_str()))
            .select(max(date))
            .first::<Option<String>>(&mut conn)
            .into_core()?;
        Ok(newest.map(|d| parse_date(&d)))
    }

    fn row_count_on(&self, day: NaiveDate) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        daily_prices
            .filter(date.eq(format_date(day)))
            .select(count_star())
            .first::<i64>(&mut conn)
            .into_core()
    }

    fn global_date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let mut conn = get_connection(&self.pool)?;
        let bounds = daily_prices
            .select((min(date), max(date)))
            .first::<(Option<String>, Option<String>)>(&mut conn)
            .into_core()?;
        Ok(match bounds {
            (Some(oldest), Some(newest)) => Some((parse_date(&oldest), parse_date(&newest))),
            _ => None,
        })
    }

    fn forward_fill_statements(&self, holiday: NaiveDate, prior: NaiveDate) -> Vec<String> {
        // Rendered dates come from NaiveDate formatting and the source marker
        // is a fixed constant, so literal inlining is safe here.
        let holiday_str = format_date(holiday);
        let prior_str = format_date(prior);
        let now = chrono::Utc::now().to_rfc3339();
        vec![format!(
            "INSERT INTO daily_prices \
             (security_id, date, open, high, low, close, adjusted_close, volume, source, created_at) \
             SELECT p.security_id, '{holiday_str}', p.close, p.close, p.close, p.close, \
             p.adjusted_close, 0, '{SOURCE_FORWARD_FILL}', '{now}' \
             FROM daily_prices p \
             WHERE p.date = '{prior_str}' \
             AND NOT EXISTS (\
             SELECT 1 FROM daily_prices q \
             WHERE q.security_id = p.security_id AND q.date = '{holiday_str}');"
        )]
    }
}
