//! Session registry: concurrent solving sessions keyed by id.
//!
//! Each session owns its puzzle, dispatcher, event bus and event history.
//! Nothing is shared between sessions except the registry map itself.

use crate::feed::{EventFeed, EventLog};
use crate::listener::{SolveListener, ToolExecution};
use crate::phase::PhaseTransition;
use crate::solver::{CrosswordSolver, SolveOutcome};
use chrono::{DateTime, Utc};
use crossclaw_core::event::{EventBus, SolverEvent};
use crossclaw_puzzle::Puzzle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub type SessionId = String;

/// Sessions kept before the oldest finished one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Events retained per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Solving,
    /// Puzzle validated
    Completed,
    /// Bounded failure: budget or backend exhausted
    Failed,
    /// The solving task itself died
    Error,
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Error)
    }
}

/// A point-in-time view of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub puzzle: String,
    pub status: SessionStatus,
    pub phase: Option<String>,
    /// Iterations that have executed at least one tool
    pub iteration: u32,
    pub tool_calls: u64,
    pub filled: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<SolveOutcome>,
    pub error: Option<String>,
}

type SharedInfo = Arc<RwLock<SessionInfo>>;

fn update(info: &SharedInfo, f: impl FnOnce(&mut SessionInfo)) {
    let mut guard = info.write().unwrap_or_else(|e| e.into_inner());
    f(&mut guard);
}

/// Keeps a session's counters current from inside the loop.
struct StatusTracker {
    info: SharedInfo,
}

impl SolveListener for StatusTracker {
    fn on_session_started(&self, _puzzle: &Puzzle) {
        update(&self.info, |info| info.status = SessionStatus::Solving);
    }

    fn on_tool_executed(&self, execution: &ToolExecution<'_>) {
        update(&self.info, |info| {
            info.iteration = execution.iteration + 1;
            info.tool_calls += 1;
            info.filled = execution.puzzle.filled_count();
        });
    }

    fn on_phase_changed(&self, transition: PhaseTransition, _iteration: u32) {
        update(&self.info, |info| info.phase = Some(transition.to.to_string()));
    }

    fn on_session_finished(&self, outcome: &SolveOutcome, _puzzle: &Puzzle) {
        update(&self.info, |info| {
            info.status = if outcome.success {
                SessionStatus::Completed
            } else {
                SessionStatus::Failed
            };
            info.iteration = outcome.iterations;
            info.tool_calls = outcome.tool_calls;
            info.filled = outcome.filled;
            info.finished_at = Some(Utc::now());
            info.outcome = Some(outcome.clone());
        });
    }
}

struct SessionEntry {
    info: SharedInfo,
    bus: EventBus,
    log: EventLog,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionEntry {
    fn snapshot(&self) -> SessionInfo {
        self.info.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Running sessions are never evicted; once `max_sessions` is reached the
/// oldest finished session makes room for a new one.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionEntry>>>,
    event_capacity: usize,
    max_sessions: usize,
    history_limit: usize,
}

impl SessionRegistry {
    pub fn new(event_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_capacity,
            max_sessions: DEFAULT_MAX_SESSIONS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }

    /// Events kept per session for [`events`](Self::events).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Spawn a solve for `puzzle` on its own task. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, puzzle: Puzzle, solver: CrosswordSolver) -> SessionId {
        let id = uuid::Uuid::new_v4().to_string();
        let bus = EventBus::new(self.event_capacity);
        let log = EventLog::new(self.history_limit);
        let info: SharedInfo = Arc::new(RwLock::new(SessionInfo {
            id: id.clone(),
            puzzle: puzzle.title().to_string(),
            status: SessionStatus::Starting,
            phase: None,
            iteration: 0,
            tool_calls: 0,
            filled: puzzle.filled_count(),
            total: puzzle.total_clues(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
            error: None,
        }));

        let solver = solver
            .with_session_id(id.clone())
            .with_listener(Arc::new(EventFeed::new(bus.clone(), id.clone()).with_log(log.clone())))
            .with_listener(Arc::new(StatusTracker { info: info.clone() }));

        let solve = tokio::spawn(async move {
            let mut dispatcher = solver.dispatcher_for(puzzle);
            solver.solve(&mut dispatcher).await
        });

        let watched = info.clone();
        let session_id = id.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = solve.await {
                error!(session_id = %session_id, error = %e, "Solve task died");
                update(&watched, |info| {
                    info.status = SessionStatus::Error;
                    info.error = Some(e.to_string());
                    info.finished_at = Some(Utc::now());
                });
            }
        });

        info!(session_id = %id, "Session started");
        let entry = Arc::new(SessionEntry {
            info,
            bus,
            log,
            handle: Mutex::new(Some(handle)),
        });
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .map(|(key, entry)| (key, entry.snapshot()))
                .filter(|(_, info)| info.status.is_finished())
                .min_by_key(|(_, info)| info.started_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                info!(session_id = %oldest, "Evicted finished session");
            }
        }
        sessions.insert(id.clone(), entry);
        id
    }

    /// Drop a finished session and return its final state. Sessions that
    /// are still solving stay registered and `None` is returned.
    pub fn remove(&self, id: &str) -> Option<SessionInfo> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let info = sessions.get(id)?.snapshot();
        if !info.status.is_finished() {
            return None;
        }
        sessions.remove(id);
        Some(info)
    }

    fn entry(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn status(&self, id: &str) -> Option<SessionInfo> {
        Some(self.entry(id)?.snapshot())
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<SessionInfo> = sessions
            .values()
            .map(|entry| entry.snapshot())
            .collect();
        all.sort_by_key(|info| info.started_at);
        all
    }

    /// Live events from now on. Use [`events`](Self::events) for history.
    pub fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<Arc<SolverEvent>>> {
        Some(self.entry(id)?.bus.subscribe())
    }

    /// The session's most recent events, oldest first.
    pub fn events(&self, id: &str) -> Option<Vec<SolverEvent>> {
        Some(self.entry(id)?.log.snapshot())
    }

    /// Wait for a session to finish and return its final state.
    pub async fn join(&self, id: &str) -> Option<SessionInfo> {
        let entry = self.entry(id)?;
        let handle = entry.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            // The watcher only fails if the runtime is shutting down
            let _ = handle.await;
        }
        self.status(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crossclaw_core::event::SolverEventKind;

    fn solving_provider() -> Arc<SequentialMockProvider> {
        Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![set_answer_call("c1", 1, "across", "CAT")]),
            make_tool_call_response(vec![
                set_answer_call("c2", 1, "down", "COW"),
                validate_call("c3", 1, "down"),
            ]),
        ]))
    }

    #[tokio::test]
    async fn session_runs_to_completion() {
        let registry = SessionRegistry::default();
        let solver = CrosswordSolver::new(solving_provider(), "mock");
        let id = registry.start(fixture(), solver);
        assert_eq!(registry.status(&id).unwrap().status, SessionStatus::Starting);

        let info = registry.join(&id).await.unwrap();
        assert_eq!(info.status, SessionStatus::Completed);
        assert_eq!(info.iteration, 2);
        assert_eq!(info.tool_calls, 3);
        assert_eq!(info.filled, 2);
        assert!(info.outcome.unwrap().success);
        assert!(info.finished_at.is_some());
    }

    #[tokio::test]
    async fn events_are_recorded_in_order() {
        let registry = SessionRegistry::default();
        let id = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        let mut rx = registry.subscribe(&id).unwrap();
        registry.join(&id).await;

        let events = registry.events(&id).unwrap();
        assert!(matches!(events.first().unwrap().kind, SolverEventKind::SessionStarted { .. }));
        assert!(matches!(events.last().unwrap().kind, SolverEventKind::SessionCompleted { iterations: 2, .. }));
        assert!(events.iter().any(|e| matches!(
            &e.kind,
            SolverEventKind::ClueSolved { answer, .. } if answer == "COW"
        )));
        assert!(events.iter().all(|e| e.session_id == id));

        let live = rx.recv().await.unwrap();
        assert!(matches!(live.kind, SolverEventKind::SessionStarted { .. }));
    }

    #[tokio::test]
    async fn sessions_do_not_share_state() {
        let registry = SessionRegistry::default();
        let solved = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        let stalled_provider = Arc::new(
            SequentialMockProvider::new(vec![]).then_repeat(make_text_response("no idea")),
        );
        let stalled = registry.start(
            fixture(),
            CrosswordSolver::new(stalled_provider, "mock").with_max_iterations(3),
        );
        assert_eq!(registry.len(), 2);

        let a = registry.join(&solved).await.unwrap();
        let b = registry.join(&stalled).await.unwrap();
        assert_eq!(a.status, SessionStatus::Completed);
        assert_eq!(b.status, SessionStatus::Failed);
        assert_eq!(b.filled, 0);
        assert_eq!(registry.list().len(), 2);
        assert!(registry.events(&stalled).unwrap().iter().all(|e| e.session_id == stalled));
    }

    #[tokio::test]
    async fn dead_task_is_reported_as_error() {
        let registry = SessionRegistry::default();
        // An empty script with no fallback panics on the first call
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let id = registry.start(fixture(), CrosswordSolver::new(provider, "mock"));

        let info = registry.join(&id).await.unwrap();
        assert_eq!(info.status, SessionStatus::Error);
        assert!(info.error.is_some());
    }

    #[tokio::test]
    async fn finished_sessions_can_be_removed() {
        let registry = SessionRegistry::default();
        let id = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        registry.join(&id).await;

        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.status, SessionStatus::Completed);
        assert!(registry.status(&id).is_none());
        assert!(registry.remove(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn running_session_is_not_removed() {
        let registry = SessionRegistry::default();
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_text_response("hmm")));
        let id = registry.start(fixture(), CrosswordSolver::new(provider, "mock").with_max_iterations(3));
        // Not yet polled on the current-thread runtime
        assert!(registry.remove(&id).is_none());
        assert_eq!(registry.len(), 1);
        registry.join(&id).await;
    }

    #[tokio::test]
    async fn oldest_finished_session_is_evicted_at_capacity() {
        let registry = SessionRegistry::default().with_max_sessions(2);
        let first = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        registry.join(&first).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        registry.join(&second).await;

        let third = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        assert_eq!(registry.len(), 2);
        assert!(registry.status(&first).is_none());
        assert!(registry.status(&second).is_some());
        registry.join(&third).await;
    }

    #[tokio::test]
    async fn running_sessions_survive_capacity() {
        let registry = SessionRegistry::default().with_max_sessions(1);
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_text_response("hmm")));
        let running = registry.start(fixture(), CrosswordSolver::new(provider, "mock").with_max_iterations(3));
        let other = registry.start(fixture(), CrosswordSolver::new(solving_provider(), "mock"));
        assert_eq!(registry.len(), 2);
        registry.join(&running).await;
        registry.join(&other).await;
    }

    #[tokio::test]
    async fn event_history_is_capped() {
        let registry = SessionRegistry::default().with_history_limit(4);
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_tool_call_response(vec![
            validate_call("c1", 1, "across"),
        ])));
        let id = registry.start(fixture(), CrosswordSolver::new(provider, "mock").with_max_iterations(10));
        registry.join(&id).await;

        let events = registry.events(&id).unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events.last().unwrap().kind, SolverEventKind::SessionFailed { .. }));
    }

    #[test]
    fn unknown_session_is_none() {
        let registry = SessionRegistry::default();
        assert!(registry.status("missing").is_none());
        assert!(registry.subscribe("missing").is_none());
        assert!(registry.is_empty());
    }
}
