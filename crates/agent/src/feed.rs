//! Turns loop callbacks into typed [`SolverEvent`]s on an [`EventBus`].

use crate::listener::{SolveListener, ToolExecution};
use crate::phase::PhaseTransition;
use crate::solver::{SolveOutcome, Termination};
use crossclaw_core::event::{EventBus, SolverEvent, SolverEventKind};
use crossclaw_puzzle::Puzzle;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Shared record of the most recent events a feed has published.
///
/// Holds at most `capacity` events; older ones are dropped first.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<SolverEvent>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
        }
    }

    pub fn push(&self, event: SolverEvent) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(event);
    }

    /// Retained events, oldest first.
    pub fn snapshot(&self) -> Vec<SolverEvent> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// A listener that publishes solver events.
///
/// Publishing is fire-and-forget: with no subscriber attached, events are
/// dropped unless an [`EventLog`] is attached as well.
pub struct EventFeed {
    bus: EventBus,
    session_id: String,
    log: Option<EventLog>,
}

impl EventFeed {
    pub fn new(bus: EventBus, session_id: impl Into<String>) -> Self {
        Self {
            bus,
            session_id: session_id.into(),
            log: None,
        }
    }

    /// Also append every event to `log`.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn emit(&self, kind: SolverEventKind) {
        let event = SolverEvent::new(self.session_id.clone(), kind);
        if let Some(log) = &self.log {
            log.push(event.clone());
        }
        self.bus.publish(event);
    }

    fn emit_progress(&self, puzzle: &Puzzle) {
        self.emit(SolverEventKind::ProgressUpdated {
            filled: puzzle.filled_count(),
            total: puzzle.total_clues(),
            percentage: puzzle.fill_ratio() * 100.0,
        });
    }
}

impl SolveListener for EventFeed {
    fn on_session_started(&self, puzzle: &Puzzle) {
        self.emit(SolverEventKind::SessionStarted {
            puzzle: puzzle.title().to_string(),
            total_clues: puzzle.total_clues(),
        });
        self.emit(SolverEventKind::GridUpdated {
            grid: puzzle.cell_views(),
            clues: puzzle.clue_views(),
        });
    }

    fn on_tool_executed(&self, execution: &ToolExecution<'_>) {
        let call = execution.call;
        let result = execution.result;
        self.emit(SolverEventKind::ToolInvoked {
            tool_name: call.name.clone(),
            arguments: call.arguments.clone(),
            success: result.success,
            message: result.output.clone(),
        });

        match call.name.as_str() {
            "set_answer" | "undo_last" if result.success => {
                self.emit(SolverEventKind::GridUpdated {
                    grid: execution.puzzle.cell_views(),
                    clues: execution.puzzle.clue_views(),
                });
            }
            "validate_clue" => {
                if let Some(data) = &result.data
                    && data["valid"] == true
                {
                    self.emit(SolverEventKind::ClueSolved {
                        number: data["clue_number"].as_u64().unwrap_or_default() as u32,
                        direction: data["direction"].as_str().unwrap_or_default().to_string(),
                        answer: data["current"].as_str().unwrap_or_default().to_string(),
                    });
                }
            }
            _ => {}
        }

        self.emit_progress(execution.puzzle);
    }

    fn on_phase_changed(&self, transition: PhaseTransition, _iteration: u32) {
        self.emit(SolverEventKind::PhaseChanged {
            from: transition.from.to_string(),
            to: transition.to.to_string(),
        });
    }

    fn on_session_finished(&self, outcome: &SolveOutcome, puzzle: &Puzzle) {
        let kind = match &outcome.termination {
            Termination::Solved => SolverEventKind::SessionCompleted {
                iterations: outcome.iterations,
                tool_calls: outcome.tool_calls as u32,
                elapsed_ms: outcome.elapsed.as_millis() as u64,
            },
            failure => SolverEventKind::SessionFailed {
                reason: failure.to_string(),
                filled: puzzle.filled_count(),
                total: puzzle.total_clues(),
            },
        };
        self.emit(kind);
    }
}
