//! Wire models shared by all providers.

mod bar;

pub use bar::DailyBar;
