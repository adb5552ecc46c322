//! Candidate queries feeding the gap detector.
//!
//! These run as raw aggregate queries over `securities` and `daily_prices`;
//! the per-row ORM path would round-trip once per security, which does not
//! scale to universe-sized scans.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text};
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::utils::parse_date;
use gapfill_core::coverage::{CoverageStore, GapCandidate};
use gapfill_core::errors::Result;
use gapfill_core::securities::{SecurityId, SecurityType};

/// Exchanges that make up the US market scope.
const US_EXCHANGES: &[&str] = &["NYSE", "NASDAQ", "AMEX", "NYSE ARCA", "BATS", "OTC"];

/// Raw candidate row shared by all three branch queries.
#[derive(QueryableByName, Debug)]
struct GapCandidateRow {
    #[diesel(sql_type = Text)]
    security_id: String,
    #[diesel(sql_type = Text)]
    ticker: String,
    #[diesel(sql_type = Bool)]
    is_tracked: bool,
    #[diesel(sql_type = Nullable<Integer>)]
    priority_tier: Option<i32>,
    #[diesel(sql_type = Integer)]
    importance: i32,
    #[diesel(sql_type = Text)]
    security_type: String,
    #[diesel(sql_type = Nullable<Text>)]
    first_date: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    last_date: Option<String>,
    #[diesel(sql_type = BigInt)]
    actual_count: i64,
}

impl From<GapCandidateRow> for GapCandidate {
    fn from(row: GapCandidateRow) -> Self {
        GapCandidate {
            security_id: SecurityId::new(row.security_id),
            ticker: row.ticker,
            is_tracked: row.is_tracked,
            priority_tier: row.priority_tier,
            importance: row.importance.clamp(1, 10) as u8,
            security_type: SecurityType::from_storage_string(&row.security_type),
            first_date: row.first_date.as_deref().map(parse_date),
            last_date: row.last_date.as_deref().map(parse_date),
            actual_count: row.actual_count,
        }
    }
}

/// SQL `IN` list of exchange names for a market scope.
///
/// Known markets expand to their exchange list; an unknown market code is
/// treated as a single exchange name. Values are quote-escaped before
/// inlining since the list length varies per market.
fn exchange_scope(market: &str) -> String {
    let names: Vec<&str> = match market {
        "US" => US_EXCHANGES.to_vec(),
        other => vec![other],
    };
    names
        .iter()
        .map(|n| format!("'{}'", n.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coverage candidate reads over the shared pool.
pub struct CoverageRepository {
    pool: Arc<DbPool>,
}

impl CoverageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl CoverageStore for CoverageRepository {
    fn tracked_candidates(&self, market: &str, limit: usize) -> Result<Vec<GapCandidate>> {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let sql = format!(
            "SELECT s.id AS security_id, s.ticker, s.is_tracked, s.priority_tier, \
             s.importance, s.security_type, \
             MIN(p.date) AS first_date, MAX(p.date) AS last_date, \
             COUNT(p.date) AS actual_count \
             FROM securities s \
             LEFT JOIN daily_prices p ON p.security_id = s.id AND p.date <= ? \
             WHERE s.is_active = 1 AND s.provider_unavailable = 0 AND s.is_tracked = 1 \
             AND s.exchange IN ({}) \
             GROUP BY s.id \
             ORDER BY s.ticker \
             LIMIT ?",
            exchange_scope(market)
        );
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<GapCandidateRow> = diesel::sql_query(sql)
            .bind::<Text, _>(today)
            .bind::<BigInt, _>(limit as i64)
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(GapCandidate::from).collect())
    }

    fn untracked_no_data(&self, market: &str, limit: usize) -> Result<Vec<GapCandidate>> {
        let sql = format!(
            "SELECT s.id AS security_id, s.ticker, s.is_tracked, s.priority_tier, \
             s.importance, s.security_type, \
             NULL AS first_date, NULL AS last_date, 0 AS actual_count \
             FROM securities s \
             LEFT JOIN daily_prices p ON p.security_id = s.id \
             WHERE p.security_id IS NULL \
             AND s.is_active = 1 AND s.provider_unavailable = 0 AND s.is_tracked = 0 \
             AND s.exchange IN ({}) \
             ORDER BY s.ticker \
             LIMIT ?",
            exchange_scope(market)
        );
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<GapCandidateRow> = diesel::sql_query(sql)
            .bind::<BigInt, _>(limit as i64)
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(GapCandidate::from).collect())
    }

    fn untracked_stale(
        &self,
        market: &str,
        staleness_days: i64,
        limit: usize,
    ) -> Result<Vec<GapCandidate>> {
        let today = Utc::now().date_naive();
        let cutoff = (today - Duration::days(staleness_days))
            .format("%Y-%m-%d")
            .to_string();
        let today = today.format("%Y-%m-%d").to_string();
        let sql = format!(
            "SELECT s.id AS security_id, s.ticker, s.is_tracked, s.priority_tier, \
             s.importance, s.security_type, \
             b.first_date, b.last_date, b.actual_count \
             FROM securities s \
             JOIN (\
             SELECT security_id, MIN(date) AS first_date, MAX(date) AS last_date, \
             COUNT(*) AS actual_count \
             FROM daily_prices WHERE date <= ? GROUP BY security_id\
             ) b ON b.security_id = s.id \
             WHERE s.is_active = 1 AND s.provider_unavailable = 0 AND s.is_tracked = 0 \
             AND s.exchange IN ({}) \
             AND b.last_date < ? \
             ORDER BY s.ticker \
             LIMIT ?",
            exchange_scope(market)
        );
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<GapCandidateRow> = diesel::sql_query(sql)
            .bind::<Text, _>(today)
            .bind::<Text, _>(cutoff)
            .bind::<BigInt, _>(limit as i64)
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(GapCandidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_scope_expands_us_market() {
        let scope = exchange_scope("US");
        assert!(scope.contains("'NYSE'"));
        assert!(scope.contains("'NASDAQ'"));
    }

    #[test]
    fn test_exchange_scope_falls_back_to_market_code() {
        assert_eq!(exchange_scope("LSE"), "'LSE'");
        assert_eq!(exchange_scope("O'HARE"), "'O''HARE'");
    }
}
