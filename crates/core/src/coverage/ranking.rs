//! Deterministic priority ordering over gap reports.
//!
//! The order is total: every pair of reports compares decisively, so
//! repeated runs against unchanged data schedule identical work. Keys, in
//! order:
//!
//! 1. tracked before untracked
//! 2. priority tier ascending (no tier ranks last)
//! 3. importance descending
//! 4. security type (common stock first)
//! 5. ticker length ascending
//! 6. missing days descending
//! 7. ticker alphabetical

use std::cmp::Ordering;

use super::model::GapReport;

/// Sorts reports into scheduling order, highest priority first.
pub fn rank_reports(reports: &mut [GapReport]) {
    reports.sort_by(compare_priority);
}

/// The seven-key priority comparison.
pub fn compare_priority(a: &GapReport, b: &GapReport) -> Ordering {
    b.is_tracked
        .cmp(&a.is_tracked)
        .then_with(|| tier_value(a).cmp(&tier_value(b)))
        .then_with(|| b.importance.cmp(&a.importance))
        .then_with(|| a.security_type.rank().cmp(&b.security_type.rank()))
        .then_with(|| a.ticker.len().cmp(&b.ticker.len()))
        .then_with(|| b.missing_days.cmp(&a.missing_days))
        .then_with(|| a.ticker.cmp(&b.ticker))
}

fn tier_value(report: &GapReport) -> i32 {
    report.priority_tier.unwrap_or(i32::MAX)
}
