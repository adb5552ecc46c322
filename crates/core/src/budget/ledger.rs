//! Resettable daily call budget.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Tracks credits consumed against a daily allowance.
///
/// The reset is lazy: the first access on a new calendar day zeroes the
/// counter, however many idle days passed in between. Within one day,
/// `calls_used_today` never exceeds `daily_budget` because a charge that
/// would cross the line is rejected before being counted.
///
/// The ledger itself is not synchronized. The single active crawl session
/// is the only charger, so callers wrap it in a mutex for status reads but
/// never contend on charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLedger {
    daily_budget: u32,
    calls_used_today: u32,
    reset_date: NaiveDate,
}

impl BudgetLedger {
    /// New ledger with a full allowance as of `today`.
    pub fn new(daily_budget: u32, today: NaiveDate) -> Self {
        Self {
            daily_budget,
            calls_used_today: 0,
            reset_date: today,
        }
    }

    /// Zeroes the counter when `today` moved past the reset date.
    fn roll_over(&mut self, today: NaiveDate) {
        if today > self.reset_date {
            debug!(
                "Budget reset: {} -> {} ({} credits used on {})",
                self.reset_date, today, self.calls_used_today, self.reset_date
            );
            self.calls_used_today = 0;
            self.reset_date = today;
        }
    }

    /// Whether `cost` more credits fit into today's allowance.
    pub fn can_afford(&mut self, cost: u32, today: NaiveDate) -> bool {
        self.roll_over(today);
        self.calls_used_today + cost <= self.daily_budget
    }

    /// Consumes `cost` credits.
    ///
    /// # Returns
    ///
    /// `false` if the charge would exceed the allowance; nothing is counted
    /// in that case.
    pub fn charge(&mut self, cost: u32, today: NaiveDate) -> bool {
        if !self.can_afford(cost, today) {
            return false;
        }
        self.calls_used_today += cost;
        true
    }

    /// Replaces the daily allowance. Credits already used today stand.
    pub fn set_daily_budget(&mut self, daily_budget: u32) {
        self.daily_budget = daily_budget;
    }

    pub fn daily_budget(&self) -> u32 {
        self.daily_budget
    }

    pub fn calls_used_today(&mut self, today: NaiveDate) -> u32 {
        self.roll_over(today);
        self.calls_used_today
    }

    /// Credits still available today.
    pub fn remaining(&mut self, today: NaiveDate) -> u32 {
        self.roll_over(today);
        self.daily_budget.saturating_sub(self.calls_used_today)
    }

    pub fn reset_date(&self) -> NaiveDate {
        self.reset_date
    }
}
