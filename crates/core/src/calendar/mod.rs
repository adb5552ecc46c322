//! Trading calendar for the US equity market.
//!
//! Answers one question for the rest of the crawler: is a given date a
//! trading day? Everything else here supports that answer or derives from
//! it:
//!
//! - [`holidays_for_year`] computes the fixed and floating market holidays
//!   of a year, each with its observed date (weekend holidays shift to the
//!   adjacent Friday/Monday).
//! - [`TradingCalendar`] caches observed-holiday sets per year and exposes
//!   trading-day predicates, previous/next walks, and range enumeration.
//! - [`TradingCalendarEntry`] is the persistable per-date row the storage
//!   layer keeps so coverage queries can count expected trading days in SQL.
//! - [`CalendarStore`] is the persistence trait the storage crate implements.

mod holidays;
mod model;
mod service;
mod store;

pub use holidays::{easter_sunday, holidays_for_year, Holiday};
pub use model::TradingCalendarEntry;
pub use service::TradingCalendar;
pub use store::CalendarStore;
