//! Coverage analysis: which trading days are missing, and in what order to
//! fill them.
//!
//! # Architecture
//!
//! ```text
//! +----------------+     +------------------+     +----------------+
//! | CoverageStore  | --> |   GapDetector    | --> | ranking (sort) |
//! | (3 candidate   |     | (3 branches:     |     | 7-key total    |
//! |  queries)      |     |  incomplete,     |     | deterministic  |
//! +----------------+     |  never loaded,   |     | order          |
//!                        |  stale)          |     +----------------+
//! +----------------+     +------------------+
//! | TradingCalendar| ----------^
//! +----------------+
//! ```
//!
//! The detector never walks the full universe row by row: the precise
//! expected-vs-actual comparison is reserved for the bounded tracked subset,
//! while untracked securities are classified by the two cheap aggregate
//! queries (never loaded, stale).

mod detector;
mod model;
mod ranking;
mod store;

pub use detector::GapDetector;
pub use model::{GapCandidate, GapKind, GapReport};
pub use ranking::{compare_priority, rank_reports};
pub use store::CoverageStore;
