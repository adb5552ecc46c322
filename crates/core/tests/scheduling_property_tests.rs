//! Property-based integration tests for the calendar, budget ledger, and
//! gap ranking.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use std::collections::HashSet;

use gapfill_core::budget::BudgetLedger;
use gapfill_core::calendar::{holidays_for_year, TradingCalendar};
use gapfill_core::coverage::{compare_priority, rank_reports, GapKind, GapReport};
use gapfill_core::securities::{SecurityId, SecurityType};

// =============================================================================
// Generators
// =============================================================================

/// Generates a date within the range the calendar is exercised over.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2015i32..2035, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_security_type() -> impl Strategy<Value = SecurityType> {
    prop_oneof![
        Just(SecurityType::CommonStock),
        Just(SecurityType::Etf),
        Just(SecurityType::Fund),
        Just(SecurityType::PreferredStock),
        Just(SecurityType::Unit),
        Just(SecurityType::Warrant),
        Just(SecurityType::Other),
    ]
}

/// Generates a gap report with every ranking key randomized.
fn arb_report() -> impl Strategy<Value = GapReport> {
    (
        "[A-Z]{1,6}",
        any::<bool>(),
        proptest::option::of(0i32..5),
        1u8..=10,
        arb_security_type(),
        0i64..500,
    )
        .prop_map(
            |(ticker, is_tracked, priority_tier, importance, security_type, missing_days)| {
                GapReport {
                    security_id: SecurityId::new(format!("sec-{}", ticker)),
                    ticker,
                    kind: GapKind::Incomplete,
                    first_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    last_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                    expected_count: missing_days + 10,
                    actual_count: 10,
                    missing_days,
                    is_tracked,
                    priority_tier,
                    importance,
                    security_type,
                }
            },
        )
}

fn arb_reports(max_count: usize) -> impl Strategy<Value = Vec<GapReport>> {
    proptest::collection::vec(arb_report(), 0..=max_count)
}

// =============================================================================
// Calendar properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Observed holiday dates are unique within a year and never fall on a
    /// weekend. Weekend holidays must have been shifted to a weekday or
    /// dropped, never duplicated onto an existing observance.
    #[test]
    fn prop_observed_holidays_unique_and_on_weekdays(year in 2015i32..2035) {
        let holidays = holidays_for_year(year);
        let mut seen = HashSet::new();
        for holiday in &holidays {
            prop_assert!(
                seen.insert(holiday.observed),
                "duplicate observance {} in {}",
                holiday.observed,
                year
            );
            let weekday = holiday.observed.weekday();
            prop_assert!(weekday != Weekday::Sat && weekday != Weekday::Sun);
        }
    }

    /// `previous_trading_day` lands on a strictly earlier trading day with
    /// no trading day in between, and symmetrically for `next_trading_day`.
    #[test]
    fn prop_adjacent_trading_days_bracket_the_input(date in arb_date()) {
        let calendar = TradingCalendar::new();

        let prev = calendar.previous_trading_day(date);
        prop_assert!(prev < date);
        prop_assert!(calendar.is_trading_day(prev));
        let mut cursor = prev + Duration::days(1);
        while cursor < date {
            prop_assert!(!calendar.is_trading_day(cursor));
            cursor += Duration::days(1);
        }

        let next = calendar.next_trading_day(date);
        prop_assert!(next > date);
        prop_assert!(calendar.is_trading_day(next));
        let mut cursor = date + Duration::days(1);
        while cursor < next {
            prop_assert!(!calendar.is_trading_day(cursor));
            cursor += Duration::days(1);
        }
    }

    /// The enumerated trading days agree with the counted total, and each
    /// enumerated day individually passes `is_trading_day`.
    #[test]
    fn prop_trading_day_enumeration_matches_count(
        start in arb_date(),
        span in 0i64..120,
    ) {
        let calendar = TradingCalendar::new();
        let end = start + Duration::days(span);

        let days = calendar.trading_days_between(start, end);
        prop_assert_eq!(days.len() as i64, calendar.count_trading_days(start, end));
        for day in &days {
            prop_assert!(calendar.is_trading_day(*day));
            prop_assert!(*day >= start && *day <= end);
        }
        // Ascending and duplicate-free.
        for pair in days.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}

// =============================================================================
// Budget ledger properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Within one day, the accepted charges never sum past the allowance,
    /// the counter equals exactly the accepted prefix sum, and a charge is
    /// accepted iff it fits at the moment it is attempted.
    #[test]
    fn prop_accepted_charges_never_exceed_budget(
        budget in 0u32..5_000,
        costs in proptest::collection::vec(0u32..400, 0..50),
    ) {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let mut ledger = BudgetLedger::new(budget, today);

        let mut accepted_sum = 0u32;
        for cost in costs {
            let fits = accepted_sum + cost <= budget;
            prop_assert_eq!(ledger.charge(cost, today), fits);
            if fits {
                accepted_sum += cost;
            }
        }
        prop_assert_eq!(ledger.calls_used_today(today), accepted_sum);
        prop_assert_eq!(ledger.remaining(today), budget - accepted_sum);
    }

    /// Moving forward across calendar days resets the counter exactly once
    /// per day transition; revisiting the same day never resets it again.
    #[test]
    fn prop_day_transition_resets_exactly_once(
        budget in 1u32..1_000,
        day_offsets in proptest::collection::vec(0i64..3, 1..20),
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let mut ledger = BudgetLedger::new(budget, start);
        let mut current = start;
        let mut expected_used = 0u32;

        for offset in day_offsets {
            let next = current + Duration::days(offset);
            if next > current {
                expected_used = 0;
                current = next;
            }
            if ledger.charge(1, current) {
                expected_used += 1;
            }
            prop_assert_eq!(ledger.calls_used_today(current), expected_used);
            prop_assert_eq!(ledger.reset_date(), current);
        }
    }
}

// =============================================================================
// Ranking properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The priority comparison is a total order: antisymmetric and
    /// transitive over arbitrary report triples.
    #[test]
    fn prop_priority_comparison_is_total_order(
        a in arb_report(),
        b in arb_report(),
        c in arb_report(),
    ) {
        prop_assert_eq!(compare_priority(&a, &b), compare_priority(&b, &a).reverse());
        if compare_priority(&a, &b) == std::cmp::Ordering::Less
            && compare_priority(&b, &c) == std::cmp::Ordering::Less
        {
            prop_assert_eq!(compare_priority(&a, &c), std::cmp::Ordering::Less);
        }
    }

    /// Ranking is deterministic: the same multiset of reports sorts to the
    /// same sequence regardless of input order.
    #[test]
    fn prop_ranking_is_input_order_independent(mut reports in arb_reports(20)) {
        let mut reversed: Vec<GapReport> = reports.iter().rev().cloned().collect();
        rank_reports(&mut reports);
        rank_reports(&mut reversed);

        let left: Vec<(&str, &str)> = reports
            .iter()
            .map(|r| (r.security_id.as_str(), r.ticker.as_str()))
            .collect();
        let right: Vec<(&str, &str)> = reversed
            .iter()
            .map(|r| (r.security_id.as_str(), r.ticker.as_str()))
            .collect();
        prop_assert_eq!(left, right);
    }

    /// When every other key ties, reports order alphabetically by ticker.
    #[test]
    fn prop_equal_keys_fall_back_to_alphabetical(
        base in arb_report(),
        suffixes in proptest::collection::hash_set("[A-Z]{3}", 2..8),
    ) {
        let mut reports: Vec<GapReport> = suffixes
            .iter()
            .map(|s| {
                let mut r = base.clone();
                r.ticker = s.clone();
                r.security_id = SecurityId::new(format!("sec-{}", s));
                r
            })
            .collect();
        rank_reports(&mut reports);

        for pair in reports.windows(2) {
            prop_assert!(pair[0].ticker < pair[1].ticker);
        }
    }
}
