//! Forward-filling of market holidays from the prior trading day's close.

mod service;

pub use service::{FillOptions, FillOutcome, HolidayForwardFiller, PendingHoliday};
