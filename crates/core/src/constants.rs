//! Crawler-wide constants.

/// Default daily call budget in credits.
pub const DEFAULT_DAILY_BUDGET: u32 = 3000;

/// A security whose newest price is older than this many calendar days is
/// considered stale and re-enters the gap cycle.
pub const STALENESS_THRESHOLD_DAYS: i64 = 30;

/// Lookback window for securities that have never been loaded.
/// The full trading-day count of this window is treated as missing.
pub const NO_DATA_LOOKBACK_YEARS: i32 = 2;

/// Maximum securities pulled into one backfill session.
pub const MAX_SECURITIES_PER_SESSION: usize = 100;

/// Maximum missing dates fetched per security per session.
/// Larger gaps are drained across multiple sessions.
pub const MAX_DATES_PER_SECURITY: usize = 50;

/// Fixed delay between consecutive upstream requests within a session.
/// Keeps the crawler well under provider rate limits; the delay itself is
/// cancellable so `stop` never waits it out.
pub const INTER_REQUEST_DELAY_MS: u64 = 1200;

/// Capacity of the bounded progress broadcast channel.
/// Slow subscribers past this depth observe a lag error and resubscribe.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Upper bound on parallel workers for explicit range loads.
pub const MAX_RANGE_WORKERS: usize = 50;

/// Default worker count for explicit range loads.
pub const DEFAULT_RANGE_WORKERS: usize = 4;

/// Importance score bounds (inclusive).
pub const IMPORTANCE_MIN: u8 = 1;
pub const IMPORTANCE_MAX: u8 = 10;
