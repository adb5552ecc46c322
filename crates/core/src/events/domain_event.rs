//! Crawl event types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backfill::SessionOutcome;

/// Events emitted by the backfill scheduler while a session runs.
///
/// These are facts about crawl progress. A presentation layer renders them;
/// nothing in the crawler reacts to its own events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A session transitioned to Running.
    #[serde(rename_all = "camelCase")]
    SessionStarted { session_id: Uuid, environment: String },

    /// One work unit finished (fetched, persisted, counted).
    #[serde(rename_all = "camelCase")]
    Progress {
        /// Ticker or date the loop just processed.
        current_unit: String,
        days_processed: u64,
        total_queued: u64,
        records_loaded_so_far: u64,
        calls_used_today: u32,
        daily_budget: u32,
    },

    /// A session reached a terminal state.
    #[serde(rename_all = "camelCase")]
    SessionEnded {
        session_id: Uuid,
        outcome: SessionOutcome,
    },
}

impl CrawlEvent {
    /// Creates a SessionStarted event.
    pub fn session_started(session_id: Uuid, environment: impl Into<String>) -> Self {
        Self::SessionStarted {
            session_id,
            environment: environment.into(),
        }
    }

    /// Creates a Progress event.
    pub fn progress(
        current_unit: impl Into<String>,
        days_processed: u64,
        total_queued: u64,
        records_loaded_so_far: u64,
        calls_used_today: u32,
        daily_budget: u32,
    ) -> Self {
        Self::Progress {
            current_unit: current_unit.into(),
            days_processed,
            total_queued,
            records_loaded_so_far,
            calls_used_today,
            daily_budget,
        }
    }

    /// Creates a SessionEnded event.
    pub fn session_ended(session_id: Uuid, outcome: SessionOutcome) -> Self {
        Self::SessionEnded {
            session_id,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_serialization_shape() {
        let event = CrawlEvent::progress("AAPL", 3, 40, 1250, 12, 3000);
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"currentUnit\":\"AAPL\""));
        assert!(json.contains("\"daysProcessed\":3"));
        assert!(json.contains("\"totalQueued\":40"));
        assert!(json.contains("\"recordsLoadedSoFar\":1250"));
        assert!(json.contains("\"callsUsedToday\":12"));
        assert!(json.contains("\"dailyBudget\":3000"));
    }

    #[test]
    fn test_session_events_round_trip() {
        let id = Uuid::new_v4();
        let event = CrawlEvent::session_ended(id, SessionOutcome::BudgetExhausted);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("session_ended"));

        match serde_json::from_str::<CrawlEvent>(&json).unwrap() {
            CrawlEvent::SessionEnded {
                session_id,
                outcome,
            } => {
                assert_eq!(session_id, id);
                assert_eq!(outcome, SessionOutcome::BudgetExhausted);
            }
            _ => panic!("Expected SessionEnded"),
        }
    }
}
