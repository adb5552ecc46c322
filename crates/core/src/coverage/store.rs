//! Coverage candidate queries.

use super::model::GapCandidate;
use crate::errors::Result;

/// Storage interface feeding the gap detector.
///
/// All three queries exclude inactive securities and securities flagged
/// provider-unavailable, and scope to one market. They return raw rows; the
/// detector applies the calendar math and the ranker the ordering.
pub trait CoverageStore: Send + Sync {
    /// Tracked securities with their price-date bounds and non-future row
    /// counts, for the precise expected-vs-actual branch.
    fn tracked_candidates(&self, market: &str, limit: usize) -> Result<Vec<GapCandidate>>;

    /// Untracked securities with no price rows at all.
    fn untracked_no_data(&self, market: &str, limit: usize) -> Result<Vec<GapCandidate>>;

    /// Untracked securities whose newest price is more than
    /// `staleness_days` calendar days old.
    fn untracked_stale(
        &self,
        market: &str,
        staleness_days: i64,
        limit: usize,
    ) -> Result<Vec<GapCandidate>>;
}
