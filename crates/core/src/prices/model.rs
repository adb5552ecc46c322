//! Price record domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::securities::SecurityId;
use gapfill_market_data::DailyBar;

// =============================================================================
// Price Source
// =============================================================================

/// Storage marker for forward-filled rows.
pub const SOURCE_FORWARD_FILL: &str = "FORWARD_FILL";
/// Storage marker for rows copied between environments.
pub const SOURCE_TRANSFER: &str = "TRANSFER";

/// Where a price record came from.
///
/// - `Provider(id)` - fetched from an upstream data provider (e.g. "EODHD")
/// - `ForwardFill` - synthesized from the prior trading day for a holiday
/// - `Transfer` - bulk-copied from another environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "provider")]
pub enum PriceSource {
    Provider(String),
    ForwardFill,
    Transfer,
}

impl PriceSource {
    /// Converts to the string representation for storage.
    pub fn to_storage_string(&self) -> String {
        match self {
            PriceSource::Provider(id) => id.clone(),
            PriceSource::ForwardFill => SOURCE_FORWARD_FILL.to_string(),
            PriceSource::Transfer => SOURCE_TRANSFER.to_string(),
        }
    }

    /// Parses from the storage string representation.
    pub fn from_storage_string(s: &str) -> Self {
        if s.eq_ignore_ascii_case(SOURCE_FORWARD_FILL) {
            PriceSource::ForwardFill
        } else if s.eq_ignore_ascii_case(SOURCE_TRANSFER) {
            PriceSource::Transfer
        } else {
            PriceSource::Provider(s.to_string())
        }
    }

    pub fn is_forward_fill(&self) -> bool {
        matches!(self, PriceSource::ForwardFill)
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_storage_string())
    }
}

// =============================================================================
// Price Record
// =============================================================================

/// One stored day of OHLCV data for one security.
///
/// Unique key: (security_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub security_id: SecurityId,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Option<Decimal>,
    pub volume: i64,
    pub source: PriceSource,
    pub created_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Builds a record from a provider bar for a resolved security.
    pub fn from_bar(security_id: SecurityId, bar: &DailyBar, source: PriceSource) -> Self {
        Self {
            security_id,
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adjusted_close: bar.adjusted_close,
            volume: bar.volume,
            source,
            created_at: Utc::now(),
        }
    }

    /// Builds the synthetic holiday row derived from the prior trading day:
    /// the prior close becomes open, high, low and close; volume is zero;
    /// the adjusted close carries over.
    pub fn holiday_copy(prior: &PriceRecord, holiday: NaiveDate) -> Self {
        Self {
            security_id: prior.security_id.clone(),
            date: holiday,
            open: prior.close,
            high: prior.close,
            low: prior.close,
            close: prior.close,
            adjusted_close: prior.adjusted_close,
            volume: 0,
            source: PriceSource::ForwardFill,
            created_at: Utc::now(),
        }
    }
}
