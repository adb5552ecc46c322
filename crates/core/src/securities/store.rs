//! Security persistence trait.

use async_trait::async_trait;
use std::collections::HashMap;

use super::model::{Security, SecurityId};
use crate::errors::Result;

/// Storage interface for the security universe.
///
/// Mutations are async (they flow through the serialized writer); lookups
/// are sync reads against the pool.
#[async_trait]
pub trait SecurityStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts or updates a security, preserving its externally assigned id.
    ///
    /// When the id exists, mutable fields and the updated timestamp change;
    /// the id itself is never reassigned. When it does not exist, the
    /// security is inserted as given.
    ///
    /// # Returns
    ///
    /// The stored security.
    async fn upsert(&self, security: &Security) -> Result<Security>;

    /// Marks a security as having no data at the provider.
    ///
    /// Marked securities are excluded from gap cycles until reset.
    async fn mark_provider_unavailable(&self, id: &SecurityId) -> Result<()>;

    /// Clears the provider-unavailable flag, re-admitting the securities to
    /// gap cycles.
    ///
    /// # Returns
    ///
    /// The number of securities whose flag was cleared.
    async fn reset_provider_unavailable(&self, ids: &[SecurityId]) -> Result<usize>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Looks up a security by id.
    fn get(&self, id: &SecurityId) -> Result<Option<Security>>;

    /// Looks up a security by ticker.
    fn get_by_ticker(&self, ticker: &str) -> Result<Option<Security>>;

    /// Resolves tickers to security ids in one query.
    ///
    /// Unknown tickers are omitted from the result.
    fn ids_for_tickers(&self, tickers: &[String]) -> Result<HashMap<String, SecurityId>>;
}
