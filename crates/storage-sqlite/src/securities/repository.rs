//! SQLite-backed security repository.

use async_trait::async_trait;
use diesel::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::securities::dsl::*;
use crate::utils::chunk_for_sqlite;
use gapfill_core::errors::Result;
use gapfill_core::securities::{Security, SecurityId, SecurityStore};

use super::model::{SecurityDB, UpdateSecurityDB};

/// Security persistence over the shared pool and serialized writer.
pub struct SecurityRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SecurityRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SecurityStore for SecurityRepository {
    async fn upsert(&self, security: &Security) -> Result<Security> {
        let insert_row = SecurityDB::from(security);
        let update_row = UpdateSecurityDB::from(security);
        let security_id = security.id.as_str().to_string();

        let stored = self
            .writer
            .exec(move |conn| {
                let existing = securities
                    .filter(id.eq(&security_id))
                    .first::<SecurityDB>(conn)
                    .optional()?;

                match existing {
                    Some(_) => {
                        diesel::update(securities.filter(id.eq(&security_id)))
                            .set(&update_row)
                            .execute(conn)?;
                    }
                    None => {
                        diesel::insert_into(securities)
                            .values(&insert_row)
                            .execute(conn)?;
                    }
                }

                let row = securities
                    .filter(id.eq(&security_id))
                    .first::<SecurityDB>(conn)?;
                Ok(row)
            })
            .await?;

        Ok(Security::from(stored))
    }

    async fn mark_provider_unavailable(&self, security_id: &SecurityId) -> Result<()> {
        let target = security_id.as_str().to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(securities.filter(id.eq(&target)))
                    .set((
                        provider_unavailable.eq(true),
                        updated_at.eq(chrono::Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn reset_provider_unavailable(&self, ids: &[SecurityId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let targets: Vec<String> = ids.iter().map(|i| i.as_str().to_string()).collect();
        let cleared = self
            .writer
            .exec(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let mut total = 0usize;
                for chunk in chunk_for_sqlite(&targets) {
                    total += diesel::update(
                        securities
                            .filter(id.eq_any(chunk))
                            .filter(provider_unavailable.eq(true)),
                    )
                    .set((provider_unavailable.eq(false), updated_at.eq(now.clone())))
                    .execute(conn)?;
                }
                Ok(total)
            })
            .await?;
        Ok(cleared)
    }

    fn get(&self, security_id: &SecurityId) -> Result<Option<Security>> {
        let mut conn = get_connection(&self.pool)?;
        let row = securities
            .filter(id.eq(security_id.as_str()))
            .first::<SecurityDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Security::from))
    }

    fn get_by_ticker(&self, symbol: &str) -> Result<Option<Security>> {
        let mut conn = get_connection(&self.pool)?;
        let row = securities
            .filter(ticker.eq(symbol))
            .first::<SecurityDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(Security::from))
    }

    fn ids_for_tickers(&self, tickers: &[String]) -> Result<HashMap<String, SecurityId>> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let mut resolved = HashMap::with_capacity(tickers.len());
        for chunk in chunk_for_sqlite(tickers) {
            let rows: Vec<(String, String)> = securities
                .filter(ticker.eq_any(chunk))
                .select((ticker, id))
                .load(&mut conn)
                .into_core()?;
            for (symbol, security_id) in rows {
                resolved.insert(symbol, SecurityId::new(security_id));
            }
        }
        Ok(resolved)
    }
}
