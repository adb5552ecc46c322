//! Daily call budget: a consumable that lazily resets once per calendar day.

mod cost;
mod ledger;

pub use cost::CostModel;
pub use ledger::BudgetLedger;
