//! Solver event system: live progress for outside observers.
//!
//! The solver publishes events as the session advances. Subscribers (a
//! terminal reporter, a future web front-end) receive them without the
//! orchestrator knowing who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// One grid cell as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    /// Current letter, `None` when empty or blocked
    pub value: Option<char>,
    /// Whether the cell belongs to at least one clue
    pub active: bool,
}

/// One clue as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueView {
    pub number: u32,
    pub direction: String,
    pub text: String,
    pub length: usize,
    /// Every cell on the light holds a letter
    pub answered: bool,
}

/// An event with its envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(flatten)]
    pub kind: SolverEventKind,
}

impl SolverEvent {
    pub fn new(session_id: impl Into<String>, kind: SolverEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.into(),
            kind,
        }
    }
}

/// Everything an observer can see happen during a solving session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SolverEventKind {
    SessionStarted {
        puzzle: String,
        total_clues: usize,
    },

    ToolInvoked {
        tool_name: String,
        arguments: serde_json::Value,
        success: bool,
        message: String,
    },

    /// Grid snapshot after a mutating tool.
    GridUpdated {
        grid: Vec<Vec<CellView>>,
        clues: Vec<ClueView>,
    },

    ClueSolved {
        number: u32,
        direction: String,
        answer: String,
    },

    ProgressUpdated {
        filled: usize,
        total: usize,
        percentage: f64,
    },

    PhaseChanged {
        from: String,
        to: String,
    },

    SessionCompleted {
        iterations: u32,
        tool_calls: u32,
        elapsed_ms: u64,
    },

    SessionFailed {
        reason: String,
        filled: usize,
        total: usize,
    },
}

/// A broadcast-based event bus for solver events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Slow
/// subscribers lag and lose events rather than block the solver.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<SolverEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: SolverEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SolverEvent>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
