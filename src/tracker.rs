use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::feed::{FixStream, LocationFeed};
use crate::pipeline::metrics::{self, DistanceModel, LiveSummary};
use crate::store::{self, PersistentStore, WORKOUT_SESSIONS_KEY};
use crate::types::workout::{elapsed_seconds, LocationFix, SessionStatus, WorkoutSession};

/// Wall clock in unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
///
/// Public so the tests under `tests/` and hosts that replay recorded workouts can drive the
/// tracker deterministically; the server itself always runs on [`SystemClock`].
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub tick_interval: Duration,
    pub distance_model: DistanceModel,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            distance_model: DistanceModel::Geodesic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StartOutcome {
    Started { session: WorkoutSession },
    AlreadyActive { session: WorkoutSession },
    /// The feed refused to start; nothing was created.
    Aborted { warning: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    NotActive,
    Completed { session: WorkoutSession },
    Discarded { session: WorkoutSession },
}

struct ActiveSession {
    session: WorkoutSession,
    generation: u64,
    stream: FixStream,
    pump: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

#[derive(Default)]
struct TrackerState {
    active: Option<ActiveSession>,
    past_sessions: Vec<WorkoutSession>,
    generation: u64,
    last_start_ms: Option<i64>,
}

impl TrackerState {
    fn active_for(&mut self, generation: u64) -> Option<&mut WorkoutSession> {
        self.active
            .as_mut()
            .filter(|active| active.generation == generation)
            .map(|active| &mut active.session)
    }
}

struct Shared {
    state: Mutex<TrackerState>,
    feed: Arc<dyn LocationFeed>,
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    options: TrackerOptions,
}

/// Owns the one current workout session and the history of saved ones.
///
/// Every mutation goes through a single async mutex, so a fix, a timer tick, `start` and
/// `stop` never interleave. Background tasks are tagged with the generation of the session
/// they were spawned for and their updates are dropped once that session has ended.
#[derive(Clone)]
pub struct SessionTracker {
    shared: Arc<Shared>,
}

impl SessionTracker {
    pub fn new(
        feed: Arc<dyn LocationFeed>,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
        options: TrackerOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TrackerState::default()),
                feed,
                store,
                clock,
                options,
            }),
        }
    }

    /// Replaces in-memory history with what the store holds. Returns the number loaded.
    pub async fn load_history(&self) -> usize {
        let sessions: Vec<WorkoutSession> =
            store::load_json(self.shared.store.as_ref(), WORKOUT_SESSIONS_KEY)
                .await
                .unwrap_or_default();
        let count = sessions.len();

        let mut state = self.shared.state.lock().await;
        state.past_sessions = sessions;
        tracing::info!("Loaded {} past workout sessions", count);
        count
    }

    pub async fn start(&self) -> StartOutcome {
        let mut state = self.shared.state.lock().await;

        if let Some(active) = state.active.as_ref() {
            tracing::debug!("Session {} already active; ignoring start", active.session.id);
            return StartOutcome::AlreadyActive {
                session: active.session.clone(),
            };
        }

        tracing::info!("Starting workout session...");
        let stream = match self.shared.feed.start_tracking().await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("Workout session not started: {}", err);
                return StartOutcome::Aborted {
                    warning: err.to_string(),
                };
            }
        };

        let start_time = self.shared.clock.now_ms();
        let id_ms = match state.last_start_ms {
            Some(last) if start_time <= last => last + 1,
            _ => start_time,
        };
        state.last_start_ms = Some(id_ms);
        state.generation += 1;
        let generation = state.generation;

        let session = WorkoutSession::begin(id_ms.to_string(), start_time);
        let pump = self.spawn_fix_pump(generation, stream.arrivals());
        let ticker = self.spawn_ticker(generation);

        tracing::info!("Workout session {} started", session.id);
        state.active = Some(ActiveSession {
            session: session.clone(),
            generation,
            stream,
            pump,
            ticker,
        });

        StartOutcome::Started { session }
    }

    /// Appends a fix to the active session. Returns `false` when no session is active.
    pub async fn on_fix_received(&self, fix: LocationFix) -> bool {
        let mut state = self.shared.state.lock().await;
        let Some(generation) = state.active.as_ref().map(|active| active.generation) else {
            tracing::debug!("Fix received while idle; ignored");
            return false;
        };
        self.apply_fix(&mut state, generation, fix)
    }

    /// Advances the active session's duration to the current time.
    pub async fn tick(&self) -> Option<u64> {
        let mut state = self.shared.state.lock().await;
        let generation = state.active.as_ref()?.generation;
        self.apply_tick(&mut state, generation)
    }

    pub async fn stop(&self, save: bool) -> StopOutcome {
        let mut state = self.shared.state.lock().await;

        let Some(mut active) = state.active.take() else {
            tracing::debug!("Stop requested with no active session");
            return StopOutcome::NotActive;
        };

        tracing::info!("Stopping workout session {}...", active.session.id);
        self.shared.feed.stop_tracking();
        active.pump.abort();
        active.ticker.abort();

        // Fixes the feed accepted before unsubscribing are still queued.
        let queued = active.stream.drain();
        if !queued.is_empty() {
            tracing::debug!("Applying {} queued fixes before finalizing", queued.len());
            active.session.route.extend(queued);
        }

        let end_time = self.shared.clock.now_ms();
        let duration = elapsed_seconds(active.session.start_time, end_time);
        let metrics =
            metrics::calculate_metrics_with(&active.session.route, self.shared.options.distance_model);

        let status = if save {
            SessionStatus::Completed
        } else {
            SessionStatus::Discarded
        };
        let finalized = active.session.finalize(end_time, duration, metrics, status);

        if save {
            state.past_sessions.push(finalized.clone());
            if let Err(err) = store::save_json(
                self.shared.store.as_ref(),
                WORKOUT_SESSIONS_KEY,
                &state.past_sessions,
            )
            .await
            {
                tracing::error!("Failed to persist workout session {}: {}", finalized.id, err);
            }
        }

        self.shared.feed.clear_history();

        tracing::info!(
            "Session {} {} ({} points, {:.0} m, {}s)",
            finalized.id,
            status.as_str(),
            finalized.route.len(),
            finalized.distance,
            finalized.duration
        );

        if save {
            StopOutcome::Completed { session: finalized }
        } else {
            StopOutcome::Discarded { session: finalized }
        }
    }

    pub async fn is_active(&self) -> bool {
        self.shared.state.lock().await.active.is_some()
    }

    pub async fn current_session(&self) -> Option<WorkoutSession> {
        let state = self.shared.state.lock().await;
        state.active.as_ref().map(|active| active.session.clone())
    }

    pub async fn past_sessions(&self) -> Vec<WorkoutSession> {
        self.shared.state.lock().await.past_sessions.clone()
    }

    pub async fn past_session(&self, id: &str) -> Option<WorkoutSession> {
        let state = self.shared.state.lock().await;
        state.past_sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Running totals for the active session, from the feed's raw history.
    pub async fn live_summary(&self) -> Option<LiveSummary> {
        // Held across the feed reads so `stop` cannot clear the history mid-snapshot.
        let state = self.shared.state.lock().await;
        let duration = state.active.as_ref()?.session.duration;
        let history = self.shared.feed.history();
        let current = self.shared.feed.current_fix();
        Some(metrics::live_summary(duration, &history, current.as_ref()))
    }

    fn apply_fix(&self, state: &mut TrackerState, generation: u64, fix: LocationFix) -> bool {
        let now = self.shared.clock.now_ms();
        let Some(session) = state.active_for(generation) else {
            return false;
        };
        session.route.push(fix);
        session.duration = elapsed_seconds(session.start_time, now);
        true
    }

    /// Moves every queued fix into the route. `None` once the session has ended.
    fn drain_fixes(&self, state: &mut TrackerState, generation: u64) -> Option<usize> {
        let now = self.shared.clock.now_ms();
        let active = state
            .active
            .as_mut()
            .filter(|active| active.generation == generation)?;
        let queued = active.stream.drain();
        let count = queued.len();
        if count > 0 {
            active.session.route.extend(queued);
            active.session.duration = elapsed_seconds(active.session.start_time, now);
        }
        Some(count)
    }

    fn apply_tick(&self, state: &mut TrackerState, generation: u64) -> Option<u64> {
        let now = self.shared.clock.now_ms();
        let session = state.active_for(generation)?;
        session.duration = elapsed_seconds(session.start_time, now);
        Some(session.duration)
    }

    /// Fixes stay in the session's stream until drained under the state lock, so aborting
    /// this task never drops one.
    fn spawn_fix_pump(&self, generation: u64, arrivals: Arc<Notify>) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            loop {
                arrivals.notified().await;
                let mut state = tracker.shared.state.lock().await;
                if tracker.drain_fixes(&mut state, generation).is_none() {
                    break;
                }
            }
        })
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let tracker = self.clone();
        let period = self.shared.options.tick_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut state = tracker.shared.state.lock().await;
                if tracker.apply_tick(&mut state, generation).is_none() {
                    break;
                }
            }
        })
    }
}
