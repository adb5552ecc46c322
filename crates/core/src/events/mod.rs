//! Crawl events module.
//!
//! Provides the event types emitted during a backfill session and the
//! bounded broadcast channel they travel over. Publication never blocks the
//! crawl loop; consumers that fall behind observe an explicit lag error and
//! resubscribe or continue from the oldest retained event.

mod broadcaster;
mod domain_event;

pub use broadcaster::*;
pub use domain_event::*;
