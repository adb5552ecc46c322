//! Budgeted backfill scheduling: sessions, cancellation, and range loads.
//!
//! The scheduler owns the one-active-session invariant and the daily
//! budget; everything else in this module exists to serve one crawl loop:
//!
//! - [`BackfillScheduler`] is the control surface (`start`, `stop`,
//!   `set_daily_budget`, `status`, `subscribe`, `load_range`).
//! - [`SessionRegistry`] hands out [`SessionHandle`]s and enforces that at
//!   most one session holds the slot; stops are addressed by handle.
//! - [`CancelToken`] threads the cooperative stop signal through every
//!   suspension point, the pacing delay included.
//! - The range loader fans explicit per-ticker history loads over a
//!   bounded worker pool, outside any session.

mod model;
mod range_loader;
mod service;
mod session;

pub use model::{
    BackfillMode, BackfillRequest, SessionOutcome, SessionSummary, UnitError, WorkUnit,
};
pub use range_loader::{RangeLoadOutcome, RangeLoadRequest};
pub use service::{BackfillScheduler, EodhdFactory, ProviderFactory, SchedulerStatus};
pub use session::{CancelToken, SessionGuard, SessionHandle, SessionRegistry};
