//! Coverage analysis models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::securities::{SecurityId, SecurityType};

/// Which detection branch produced a gap report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// Has data, but fewer rows than expected trading days in its range.
    Incomplete,
    /// No price rows at all; the whole lookback window counts as missing.
    NeverLoaded,
    /// Has data, but the newest row is older than the staleness threshold.
    /// Counts here are calendar days since the last price, not trading days.
    Stale,
}

/// Raw per-security row returned by the coverage queries.
///
/// The store does no calendar math; the detector turns candidates into
/// [`GapReport`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapCandidate {
    pub security_id: SecurityId,
    pub ticker: String,
    pub is_tracked: bool,
    pub priority_tier: Option<i32>,
    pub importance: u8,
    pub security_type: SecurityType,
    /// Oldest stored price date, if any rows exist.
    pub first_date: Option<NaiveDate>,
    /// Newest stored price date, if any rows exist.
    pub last_date: Option<NaiveDate>,
    /// Non-future price rows stored for this security.
    pub actual_count: i64,
}

/// One security's detected coverage gap, ready for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapReport {
    pub security_id: SecurityId,
    pub ticker: String,
    pub kind: GapKind,
    /// Start of the window the gap was measured over.
    pub first_date: NaiveDate,
    /// End of the window, never in the future.
    pub last_date: NaiveDate,
    pub expected_count: i64,
    pub actual_count: i64,
    /// `max(0, expected_count - actual_count)`; never negative.
    pub missing_days: i64,
    // Ranking inputs
    pub is_tracked: bool,
    pub priority_tier: Option<i32>,
    pub importance: u8,
    pub security_type: SecurityType,
}

impl GapReport {
    /// Carries the ranking inputs over from a candidate.
    pub(crate) fn from_candidate(
        candidate: &GapCandidate,
        kind: GapKind,
        first_date: NaiveDate,
        last_date: NaiveDate,
        expected_count: i64,
        actual_count: i64,
    ) -> Self {
        Self {
            security_id: candidate.security_id.clone(),
            ticker: candidate.ticker.clone(),
            kind,
            first_date,
            last_date,
            expected_count,
            actual_count,
            missing_days: (expected_count - actual_count).max(0),
            is_tracked: candidate.is_tracked,
            priority_tier: candidate.priority_tier,
            importance: candidate.importance,
            security_type: candidate.security_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate() -> GapCandidate {
        GapCandidate {
            security_id: SecurityId::new("sec-1"),
            ticker: "AAPL".to_string(),
            is_tracked: true,
            priority_tier: Some(1),
            importance: 9,
            security_type: SecurityType::CommonStock,
            first_date: Some(date(2024, 1, 2)),
            last_date: Some(date(2024, 1, 31)),
            actual_count: 19,
        }
    }

    #[test]
    fn test_missing_days_never_negative() {
        let report = GapReport::from_candidate(
            &candidate(),
            GapKind::Incomplete,
            date(2024, 1, 2),
            date(2024, 1, 31),
            10,
            19,
        );
        assert_eq!(report.missing_days, 0);
    }

    #[test]
    fn test_missing_days_difference() {
        let report = GapReport::from_candidate(
            &candidate(),
            GapKind::Incomplete,
            date(2024, 1, 2),
            date(2024, 1, 31),
            21,
            19,
        );
        assert_eq!(report.missing_days, 2);
    }
}
