//! Budgeted, cancellable backfill sessions.
//!
//! # Session lifecycle
//!
//! ```text
//!            start(request)                   loop per work unit
//!  Idle ───────────────────────> Running ─────────────────────────┐
//!   ^   (rejected while Running)    │   1. cancel signal? ── stop │
//!   │                               │   2. budget afford?  ── stop│
//!   │                               │   3. fetch unit             │
//!   │                               │   4. charge on completion   │
//!   │                               │   5. sync rows              │
//!   │                               │   6. progress event         │
//!   │                               │   7. cancellable delay      │
//!   │                               v                             │
//!   └── Completed / BudgetExhausted / Cancelled / Errored <───────┘
//! ```
//!
//! One session runs at a time; the loop is strictly sequential, so the
//! budget ledger sees one charger and never needs cross-unit locking. The
//! fetch is charged only once it completes (success or a conclusive empty
//! answer); a failed call costs nothing. Unit failures are recorded and the
//! session moves on; only an unreachable store ends it early.

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::model::{
    BackfillMode, BackfillRequest, SessionOutcome, SessionSummary, UnitError, WorkUnit,
};
use super::range_loader::{RangeLoadOutcome, RangeLoadRequest, RangeLoader};
use super::session::{CancelToken, SessionGuard, SessionHandle, SessionRegistry};
use crate::budget::BudgetLedger;
use crate::constants::{
    DEFAULT_DAILY_BUDGET, INTER_REQUEST_DELAY_MS, MAX_DATES_PER_SECURITY, MAX_RANGE_WORKERS,
    MAX_SECURITIES_PER_SESSION, PROGRESS_CHANNEL_CAPACITY,
};
use crate::coverage::GapDetector;
use crate::errors::{BackfillError, Error, Result};
use crate::events::{CrawlEvent, EventBroadcaster};
use crate::prices::PriceSource;
use crate::securities::{SecurityId, SecurityStore};
use crate::sync::PriceSyncService;
use gapfill_market_data::{
    ApiEnvironment, DailyBar, EodhdProvider, PriceDataProvider, ProviderError,
};

/// Builds a provider for a target environment.
///
/// Sessions against different environments and tests against scripted
/// providers share one code path through this seam.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, environment: ApiEnvironment) -> Arc<dyn PriceDataProvider>;
}

/// Factory for the EODHD HTTP provider.
pub struct EodhdFactory {
    api_token: String,
}

impl EodhdFactory {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
        }
    }
}

impl ProviderFactory for EodhdFactory {
    fn create(&self, environment: ApiEnvironment) -> Arc<dyn PriceDataProvider> {
        Arc::new(EodhdProvider::new(environment, self.api_token.clone()))
    }
}

/// Point-in-time scheduler snapshot for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub calls_used_today: u32,
    pub daily_budget: u32,
    pub remaining_calls: u32,
}

/// Counters threaded through one crawl loop.
#[derive(Default)]
struct CrawlProgress {
    units_processed: usize,
    units_remaining: usize,
    records_loaded: u64,
    records_skipped: u64,
    calls_charged: u32,
    unit_errors: Vec<UnitError>,
    abort_message: Option<String>,
}

/// Turns ranked coverage gaps into budgeted provider calls.
pub struct BackfillScheduler {
    detector: Arc<GapDetector>,
    sync: Arc<PriceSyncService>,
    securities: Arc<dyn SecurityStore>,
    provider_factory: Arc<dyn ProviderFactory>,
    registry: SessionRegistry,
    ledger: Mutex<BudgetLedger>,
    events: EventBroadcaster,
    last_summary: Mutex<Option<SessionSummary>>,
    request_delay: Duration,
}

impl BackfillScheduler {
    pub fn new(
        detector: Arc<GapDetector>,
        sync: Arc<PriceSyncService>,
        securities: Arc<dyn SecurityStore>,
        provider_factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            detector,
            sync,
            securities,
            provider_factory,
            registry: SessionRegistry::new(),
            ledger: Mutex::new(BudgetLedger::new(
                DEFAULT_DAILY_BUDGET,
                Utc::now().date_naive(),
            )),
            events: EventBroadcaster::new(PROGRESS_CHANNEL_CAPACITY),
            last_summary: Mutex::new(None),
            request_delay: Duration::from_millis(INTER_REQUEST_DELAY_MS),
        }
    }

    /// Overrides the pacing delay between consecutive upstream requests.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    fn lock_ledger(&self) -> MutexGuard<'_, BudgetLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_summary(&self) -> MutexGuard<'_, Option<SessionSummary>> {
        self.last_summary.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawns a session in the background, returning its handle right away.
    ///
    /// # Errors
    ///
    /// [`BackfillError::AlreadyRunning`] while a session is active; the slot
    /// is claimed here, synchronously, so concurrent starts cannot race past
    /// the guard.
    pub fn start(self: &Arc<Self>, request: BackfillRequest) -> Result<SessionHandle> {
        let (guard, token) = self.registry.begin()?;
        let handle = guard.handle();
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.run_session(request, guard, token).await;
        });
        Ok(handle)
    }

    /// Runs one session to completion on the caller's task.
    ///
    /// # Errors
    ///
    /// [`BackfillError::AlreadyRunning`]; every in-session failure ends up
    /// in the summary instead, under a terminal outcome.
    pub async fn run(&self, request: BackfillRequest) -> Result<SessionSummary> {
        let (guard, token) = self.registry.begin()?;
        Ok(self.run_session(request, guard, token).await)
    }

    /// Asks the identified session to stop at its next checkpoint.
    ///
    /// Returns `false` when that session is no longer active. Never blocks:
    /// in-flight work finishes, the loop just starts no new unit.
    pub fn stop(&self, handle: &SessionHandle) -> bool {
        let stopped = self.registry.request_stop(handle);
        if stopped {
            info!("Stop requested for session {}", handle.id());
        } else {
            debug!("Stop request for inactive session {}", handle.id());
        }
        stopped
    }

    /// Replaces the daily allowance. Credits already used today stand.
    pub fn set_daily_budget(&self, daily_budget: u32) {
        info!("Daily budget set to {}", daily_budget);
        self.lock_ledger().set_daily_budget(daily_budget);
    }

    pub fn status(&self) -> SchedulerStatus {
        let today = Utc::now().date_naive();
        let mut ledger = self.lock_ledger();
        SchedulerStatus {
            is_running: self.registry.is_running(),
            calls_used_today: ledger.calls_used_today(today),
            daily_budget: ledger.daily_budget(),
            remaining_calls: ledger.remaining(today),
        }
    }

    /// Live event stream. Late subscribers miss earlier events; slow ones
    /// observe a lag error and may resubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.events.subscribe()
    }

    /// Summary of the most recently finished session.
    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.lock_summary().clone()
    }

    async fn run_session(
        &self,
        request: BackfillRequest,
        guard: SessionGuard,
        token: CancelToken,
    ) -> SessionSummary {
        let session_id = guard.id();
        let started_at = Utc::now();
        let clock = Instant::now();

        // First ledger access of the session rolls the allowance over to
        // today.
        let available = self.lock_ledger().remaining(started_at.date_naive());
        info!(
            "Session {} started: {:?} mode, environment {}, market {}, {} credits available",
            session_id, request.mode, request.environment, request.market, available
        );
        self.events.publish(CrawlEvent::session_started(
            session_id,
            request.environment.as_str(),
        ));

        let (outcome, progress) = self.crawl(&request, session_id, token).await;

        let summary = SessionSummary {
            session_id,
            environment: request.environment.to_string(),
            mode: request.mode,
            outcome,
            started_at,
            elapsed_ms: clock.elapsed().as_millis() as u64,
            units_processed: progress.units_processed,
            units_remaining: progress.units_remaining,
            records_loaded: progress.records_loaded,
            records_skipped: progress.records_skipped,
            calls_charged: progress.calls_charged,
            unit_errors: progress.unit_errors,
            abort_message: progress.abort_message,
        };

        info!(
            "Session {} ended: {} ({} units, {} records loaded, {} credits, {} ms)",
            session_id,
            summary.outcome,
            summary.units_processed,
            summary.records_loaded,
            summary.calls_charged,
            summary.elapsed_ms
        );
        self.events
            .publish(CrawlEvent::session_ended(session_id, summary.outcome));
        *self.lock_summary() = Some(summary.clone());
        // The slot opens only once the summary is visible.
        drop(guard);
        summary
    }

    async fn crawl(
        &self,
        request: &BackfillRequest,
        session_id: Uuid,
        mut token: CancelToken,
    ) -> (SessionOutcome, CrawlProgress) {
        let mut progress = CrawlProgress::default();

        let units = match self.derive_units(request) {
            Ok(units) => units,
            Err(err) => {
                error!("Session {}: gap analysis failed: {}", session_id, err);
                progress.abort_message = Some(err.to_string());
                return (SessionOutcome::Errored, progress);
            }
        };
        if units.is_empty() {
            info!("Session {}: no coverage gaps to fill", session_id);
            return (SessionOutcome::Completed, progress);
        }

        let total = units.len();
        info!(
            "Session {}: {} units queued covering {} trading days",
            session_id,
            total,
            units.iter().map(WorkUnit::day_span).sum::<usize>()
        );

        let provider = self.provider_factory.create(request.environment);
        let source = PriceSource::Provider(provider.id().to_string());
        let mut days_processed: u64 = 0;

        for (index, unit) in units.iter().enumerate() {
            if token.is_cancelled() {
                info!(
                    "Session {}: stopped at unit {}/{}",
                    session_id,
                    index + 1,
                    total
                );
                progress.units_remaining = total - index;
                return (SessionOutcome::Cancelled, progress);
            }

            let cost = unit.cost(&request.cost_model);
            let today = Utc::now().date_naive();
            if !self.lock_ledger().can_afford(cost, today) {
                info!(
                    "Session {}: budget exhausted before unit {}/{} ({} credits needed)",
                    session_id,
                    index + 1,
                    total,
                    cost
                );
                progress.units_remaining = total - index;
                return (SessionOutcome::BudgetExhausted, progress);
            }

            match self.fetch_unit(provider.as_ref(), unit).await {
                Ok(bars) => {
                    progress.calls_charged += self.charge(cost);
                    days_processed += unit.day_span() as u64;

                    match self.sync.sync_bars(&bars, &source).await {
                        Ok(report) => {
                            progress.records_loaded += report.inserted as u64;
                            progress.records_skipped += report.skipped as u64;
                            if !report.unknown_tickers.is_empty() {
                                debug!(
                                    "Session {}: {} unknown tickers in {}",
                                    session_id,
                                    report.unknown_tickers.len(),
                                    unit.label()
                                );
                            }
                        }
                        Err(err) if err.is_store_unreachable() => {
                            error!(
                                "Session {}: store unreachable, aborting: {}",
                                session_id, err
                            );
                            progress.units_remaining = total - index;
                            progress.abort_message = Some(err.to_string());
                            return (SessionOutcome::Errored, progress);
                        }
                        Err(err) => {
                            warn!(
                                "Session {}: failed to persist {}: {}",
                                session_id,
                                unit.label(),
                                err
                            );
                            progress.unit_errors.push(UnitError {
                                unit: unit.label(),
                                message: err.to_string(),
                            });
                        }
                    }
                }
                Err(err) if err.is_benign() => {
                    // A conclusive empty answer is a completed, charged call.
                    progress.calls_charged += self.charge(cost);
                    days_processed += unit.day_span() as u64;
                    self.handle_no_data(session_id, unit).await;
                }
                Err(err) => {
                    // The call was not served; it costs nothing.
                    warn!(
                        "Session {}: fetch failed for {} ({:?}): {}",
                        session_id,
                        unit.label(),
                        err.retry_class(),
                        err
                    );
                    progress.unit_errors.push(UnitError {
                        unit: unit.label(),
                        message: err.to_string(),
                    });
                }
            }

            progress.units_processed = index + 1;
            let (used, budget) = {
                let mut ledger = self.lock_ledger();
                let today = Utc::now().date_naive();
                (ledger.calls_used_today(today), ledger.daily_budget())
            };
            self.events.publish(CrawlEvent::progress(
                unit.label(),
                days_processed,
                total as u64,
                progress.records_loaded,
                used,
                budget,
            ));

            if index + 1 < total && !token.sleep(self.request_delay).await {
                info!("Session {}: stopped during pacing delay", session_id);
                progress.units_remaining = total - (index + 1);
                return (SessionOutcome::Cancelled, progress);
            }
        }

        (SessionOutcome::Completed, progress)
    }

    /// Ranked gaps, capped and shaped into the session mode's unit kind.
    fn derive_units(&self, request: &BackfillRequest) -> Result<Vec<WorkUnit>> {
        let max_securities = request.max_securities.min(MAX_SECURITIES_PER_SESSION);
        let max_dates = request.max_dates_per_security.min(MAX_DATES_PER_SECURITY);

        let reports =
            self.detector
                .analyze_gaps(&request.market, max_securities, request.include_untracked)?;

        match request.mode {
            BackfillMode::PerSecurity => {
                let mut units = Vec::new();
                for report in &reports {
                    let mut dates = self.detector.missing_dates(
                        &report.security_id,
                        report.first_date,
                        report.last_date,
                    )?;
                    dates.truncate(max_dates);
                    if dates.is_empty() {
                        continue;
                    }
                    units.push(WorkUnit::Security {
                        security_id: report.security_id.clone(),
                        ticker: report.ticker.clone(),
                        dates,
                    });
                }
                Ok(units)
            }
            BackfillMode::BulkByDate => {
                let mut seen = HashSet::new();
                let mut all_dates = Vec::new();
                for report in &reports {
                    let mut dates = self.detector.missing_dates(
                        &report.security_id,
                        report.first_date,
                        report.last_date,
                    )?;
                    dates.truncate(max_dates);
                    for date in dates {
                        if seen.insert(date) {
                            all_dates.push(date);
                        }
                    }
                }
                // One bulk call covers every security on that date.
                all_dates.sort_unstable_by(|a, b| b.cmp(a));
                Ok(all_dates.into_iter().map(WorkUnit::Date).collect())
            }
        }
    }

    async fn fetch_unit(
        &self,
        provider: &dyn PriceDataProvider,
        unit: &WorkUnit,
    ) -> std::result::Result<Vec<DailyBar>, ProviderError> {
        match unit {
            WorkUnit::Date(date) => provider.fetch_bulk_for_date(*date).await,
            WorkUnit::Security { ticker, dates, .. } => {
                // Dates are newest first; the provider takes an inclusive
                // ascending range.
                match (dates.last(), dates.first()) {
                    (Some(&start), Some(&end)) => {
                        provider.fetch_history(ticker, start, end).await
                    }
                    _ => Ok(Vec::new()),
                }
            }
        }
    }

    async fn handle_no_data(&self, session_id: Uuid, unit: &WorkUnit) {
        match unit {
            WorkUnit::Security {
                security_id,
                ticker,
                ..
            } => {
                info!(
                    "Session {}: no provider data for {}, marking unavailable",
                    session_id, ticker
                );
                if let Err(err) = self.securities.mark_provider_unavailable(security_id).await {
                    warn!(
                        "Session {}: could not mark {} unavailable: {}",
                        session_id, ticker, err
                    );
                }
            }
            WorkUnit::Date(date) => {
                debug!("Session {}: empty bulk response for {}", session_id, date);
            }
        }
    }

    fn charge(&self, cost: u32) -> u32 {
        let today = Utc::now().date_naive();
        if self.lock_ledger().charge(cost, today) {
            cost
        } else {
            // Lost a race with a concurrent budget reduction. The call
            // already happened; leave it uncounted rather than overrun the
            // new allowance.
            warn!("Charge of {} credits rejected after a completed fetch", cost);
            0
        }
    }

    /// Loads `start..=end` for an explicit ticker list outside any session.
    ///
    /// The whole cost is approved and charged before dispatch; tickers the
    /// remaining allowance cannot cover are reported per ticker instead of
    /// fetched. Requested tickers are readmitted to future gap cycles by
    /// clearing their provider-unavailable flag.
    ///
    /// # Errors
    ///
    /// [`BackfillError::InvalidConfiguration`] when `start > end`. Security
    /// lookups propagate store errors.
    pub async fn load_range(&self, request: RangeLoadRequest) -> Result<RangeLoadOutcome> {
        if request.start > request.end {
            return Err(Error::Backfill(BackfillError::InvalidConfiguration(
                format!("range start {} is after end {}", request.start, request.end),
            )));
        }

        let mut seen = HashSet::new();
        let tickers: Vec<String> = request
            .tickers
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if tickers.is_empty() {
            return Ok(RangeLoadOutcome::default());
        }

        let workers = request.workers.clamp(1, MAX_RANGE_WORKERS);
        let cost_per_ticker = request.cost_model.range_fetch;
        let today = Utc::now().date_naive();

        let (dispatch, denied, charged) = {
            let mut ledger = self.lock_ledger();
            let affordable = if cost_per_ticker == 0 {
                tickers.len()
            } else {
                (ledger.remaining(today) / cost_per_ticker) as usize
            };
            let cut = tickers.len().min(affordable);
            let charged = cost_per_ticker * cut as u32;
            if charged > 0 {
                ledger.charge(charged, today);
            }
            let denied = tickers[cut..].to_vec();
            (tickers[..cut].to_vec(), denied, charged)
        };

        info!(
            "Range load: {} tickers over {}..={} with {} workers ({} credits)",
            dispatch.len(),
            request.start,
            request.end,
            workers,
            charged
        );

        // An explicit load readmits its tickers to future gap cycles.
        let ids: Vec<SecurityId> = self
            .securities
            .ids_for_tickers(&dispatch)?
            .into_values()
            .collect();
        if !ids.is_empty() {
            let reset = self.securities.reset_provider_unavailable(&ids).await?;
            if reset > 0 {
                info!(
                    "Range load: cleared provider-unavailable on {} securities",
                    reset
                );
            }
        }

        let provider = self.provider_factory.create(request.environment);
        let loader = RangeLoader::new(provider, Arc::clone(&self.sync));
        let mut outcome = loader
            .load(dispatch, request.start, request.end, workers)
            .await;
        outcome.calls_charged = charged;
        for ticker in denied {
            outcome.per_ticker_errors.push(UnitError {
                unit: ticker,
                message: "daily budget exhausted before dispatch".to_string(),
            });
        }
        outcome.per_ticker_errors.sort_by(|a, b| a.unit.cmp(&b.unit));
        Ok(outcome)
    }
}
