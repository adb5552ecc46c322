//! Session requests, work units, and summaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::budget::CostModel;
use crate::constants::{MAX_DATES_PER_SECURITY, MAX_SECURITIES_PER_SESSION};
use crate::securities::SecurityId;
use gapfill_market_data::ApiEnvironment;

/// How detected gaps are turned into provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackfillMode {
    /// One ranged history request per gapped security.
    PerSecurity,
    /// One bulk end-of-day request per missing date, covering every
    /// instrument on the exchange at once.
    BulkByDate,
}

/// Parameters of one backfill session.
#[derive(Debug, Clone)]
pub struct BackfillRequest {
    /// Deployment environment the provider endpoint is resolved from.
    pub environment: ApiEnvironment,
    pub mode: BackfillMode,
    /// Market the gap queries are scoped to.
    pub market: String,
    /// Pull never-loaded and stale untracked securities into the session.
    pub include_untracked: bool,
    /// Securities per session, at most [`MAX_SECURITIES_PER_SESSION`].
    pub max_securities: usize,
    /// Missing dates per security, at most [`MAX_DATES_PER_SECURITY`].
    pub max_dates_per_security: usize,
    pub cost_model: CostModel,
}

impl Default for BackfillRequest {
    fn default() -> Self {
        Self {
            environment: ApiEnvironment::Production,
            mode: BackfillMode::BulkByDate,
            market: "US".to_string(),
            include_untracked: true,
            max_securities: MAX_SECURITIES_PER_SESSION,
            max_dates_per_security: MAX_DATES_PER_SECURITY,
            cost_model: CostModel::default(),
        }
    }
}

/// One budgetable unit of crawl work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// Ranged history fetch covering one security's missing dates.
    Security {
        security_id: SecurityId,
        ticker: String,
        /// Missing trading days, newest first. Never empty.
        dates: Vec<NaiveDate>,
    },
    /// Bulk end-of-day fetch for one date.
    Date(NaiveDate),
}

impl WorkUnit {
    /// Credits one fetch of this unit consumes.
    pub fn cost(&self, model: &CostModel) -> u32 {
        match self {
            Self::Security { .. } => model.range_fetch,
            Self::Date(_) => model.bulk_fetch,
        }
    }

    /// Trading days this unit would cover.
    pub fn day_span(&self) -> usize {
        match self {
            Self::Security { dates, .. } => dates.len(),
            Self::Date(_) => 1,
        }
    }

    /// Short label for progress events and logs.
    pub fn label(&self) -> String {
        match self {
            Self::Security { ticker, dates, .. } => {
                format!("{} ({} days)", ticker, dates.len())
            }
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Terminal state of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionOutcome {
    /// Every queued unit was processed.
    Completed,
    /// The daily allowance ran out with units still queued.
    BudgetExhausted,
    /// An operator stop request ended the session early.
    Cancelled,
    /// The session aborted on an unrecoverable failure.
    Errored,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::BudgetExhausted => "budget exhausted",
            Self::Cancelled => "cancelled",
            Self::Errored => "errored",
        })
    }
}

/// A unit that failed without ending its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitError {
    /// Label of the failing unit (ticker or date).
    pub unit: String,
    pub message: String,
}

/// What one session accomplished, kept until the next session overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub environment: String,
    pub mode: BackfillMode,
    pub outcome: SessionOutcome,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Units a fetch was attempted for.
    pub units_processed: usize,
    /// Units still queued when the session ended.
    pub units_remaining: usize,
    pub records_loaded: u64,
    pub records_skipped: u64,
    /// Credits charged to the daily allowance by this session.
    pub calls_charged: u32,
    pub unit_errors: Vec<UnitError>,
    /// Failure that ended the session, when the outcome is errored.
    pub abort_message: Option<String>,
}
