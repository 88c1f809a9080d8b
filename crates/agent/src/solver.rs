//! The orchestrator loop: phase → compress → backend → tools → check.

use crate::context::{ContextCompressor, puzzle_description, silence_reminder, system_prompt};
use crate::listener::{SolveListener, ToolExecution};
use crate::phase::PhaseTracker;
use crossclaw_config::{AppConfig, CandidateConfig};
use crossclaw_core::message::{Conversation, Message};
use crossclaw_core::provider::{Provider, ProviderRequest};
use crossclaw_core::tool::ToolCall;
use crossclaw_providers::{RetryPolicy, RetryProvider};
use crossclaw_tools::{CandidateBackend, ToolDispatcher};
use crossclaw_puzzle::Puzzle;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    Solved,
    IterationBudget,
    /// The backend kept failing after retries
    BackendExhausted { error: String },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solved => f.write_str("solved"),
            Self::IterationBudget => f.write_str("iteration budget exhausted"),
            Self::BackendExhausted { error } => write!(f, "backend unavailable: {error}"),
        }
    }
}

/// Result of one solving session. Failure is a value here, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    pub success: bool,
    pub iterations: u32,
    pub tool_calls: u64,
    pub filled: usize,
    pub total: usize,
    pub fill_ratio: f64,
    pub elapsed: Duration,
    pub termination: Termination,
}

/// Drives a language-model backend through the crossword tools until the
/// puzzle validates or a budget runs out.
pub struct CrosswordSolver {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model (or deployment) to use
    model: String,

    /// Temperature for solver turns
    temperature: f32,

    /// Max tokens per response
    max_tokens: Option<u32>,

    /// Hard stop
    max_iterations: u32,

    compressor: ContextCompressor,

    /// Nudge the backend when it answers without a tool call
    reminder_on_silence: bool,

    /// Settings handed to `generate_candidates`
    candidates: CandidateConfig,

    listeners: Vec<Arc<dyn SolveListener>>,

    session_id: String,
}

impl CrosswordSolver {
    /// Create a solver with default settings and no retry wrapper.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: 400,
            compressor: ContextCompressor::default(),
            reminder_on_silence: true,
            candidates: CandidateConfig::default(),
            listeners: Vec::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create a solver from configuration. The provider is wrapped with the
    /// configured retry policy.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let retrying: Arc<dyn Provider> =
            Arc::new(RetryProvider::with_policy(provider, RetryPolicy::from(&config.retry)));
        let mut solver = Self::new(retrying, config.default_model.clone())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(config.solver.max_iterations)
            .with_compression(config.solver.compress_every, config.solver.compress_threshold)
            .with_reminder(config.solver.reminder_on_silence);
        solver.candidates = config.candidates.clone();
        solver
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_compression(mut self, every: u32, threshold: usize) -> Self {
        self.compressor = ContextCompressor::new(every, threshold);
        self
    }

    pub fn with_reminder(mut self, enabled: bool) -> Self {
        self.reminder_on_silence = enabled;
        self
    }

    /// Wrap the current provider in a [`RetryProvider`].
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.provider = Arc::new(RetryProvider::with_policy(self.provider, policy));
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SolveListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// A dispatcher for `puzzle` whose `generate_candidates` uses this
    /// solver's backend.
    pub fn dispatcher_for(&self, puzzle: Puzzle) -> ToolDispatcher {
        let backend = CandidateBackend::from_config(self.provider.clone(), self.model.clone(), &self.candidates);
        ToolDispatcher::new(puzzle).with_candidate_backend(backend)
    }

    /// Run the loop to completion.
    pub async fn solve(&self, dispatcher: &mut ToolDispatcher) -> SolveOutcome {
        let started = Instant::now();
        let calls_before = dispatcher.call_count();
        let mut tracker = PhaseTracker::starting_at(dispatcher.puzzle().filled_count());
        let definitions = dispatcher.definitions();

        let mut conversation = Conversation::new();
        conversation.set_system(system_prompt(tracker.phase()));
        conversation.push(Message::user(puzzle_description(dispatcher.puzzle())));

        info!(
            session_id = %self.session_id,
            puzzle = %dispatcher.puzzle().title(),
            total = dispatcher.puzzle().total_clues(),
            max_iterations = self.max_iterations,
            "Starting solve"
        );
        for listener in &self.listeners {
            listener.on_session_started(dispatcher.puzzle());
        }

        let mut iterations = 0u32;
        let termination = loop {
            if dispatcher.puzzle().validate_all() {
                break Termination::Solved;
            }
            if iterations >= self.max_iterations {
                warn!(
                    session_id = %self.session_id,
                    iterations,
                    filled = dispatcher.puzzle().filled_count(),
                    total = dispatcher.puzzle().total_clues(),
                    "Iteration budget reached"
                );
                break Termination::IterationBudget;
            }
            let iteration = iterations;
            iterations += 1;

            // Evaluated once per completed backend turn
            let transition = if iteration > 0 {
                tracker.evaluate(dispatcher.puzzle().filled_count())
            } else {
                None
            };
            if let Some(transition) = transition {
                info!(
                    session_id = %self.session_id,
                    iteration,
                    from = %transition.from,
                    phase = %transition.to,
                    "Phase changed"
                );
                conversation.set_system(system_prompt(transition.to));
                for listener in &self.listeners {
                    listener.on_phase_changed(transition, iteration);
                }
            }

            if self.compressor.should_compress(iteration, conversation.len()) {
                let dropped = self.compressor.compress(&mut conversation, dispatcher.puzzle());
                debug!(session_id = %self.session_id, iteration, dropped, "Compressed context");
            }

            debug!(
                session_id = %self.session_id,
                iteration,
                phase = %tracker.phase(),
                messages = conversation.len(),
                "Solver iteration"
            );

            let mut request = ProviderRequest::new(self.model.clone(), conversation.messages.clone());
            request.temperature = self.temperature;
            request.max_tokens = self.max_tokens;
            request.tools = definitions.clone();

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(session_id = %self.session_id, iteration, error = %e, "Backend failed");
                    break Termination::BackendExhausted { error: e.to_string() };
                }
            };

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            if tool_calls.is_empty() {
                if dispatcher.puzzle().validate_all() {
                    break Termination::Solved;
                }
                debug!(session_id = %self.session_id, iteration, "Backend replied without tools");
                if self.reminder_on_silence {
                    conversation.push(Message::user(silence_reminder(dispatcher.puzzle())));
                }
                continue;
            }

            for tc in &tool_calls {
                let call_started = Instant::now();
                let (call, result) = match ToolCall::from_message(tc) {
                    Ok(call) => {
                        let result = dispatcher.dispatch(&call).await;
                        (call, result)
                    }
                    Err(e) => {
                        let result = dispatcher.reject(&tc.id, &tc.name, e);
                        let call = ToolCall {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            arguments: serde_json::Value::String(tc.arguments.clone()),
                        };
                        (call, result)
                    }
                };
                conversation.push(Message::tool_result(&tc.id, result.to_content()));

                if !result.success {
                    debug!(tool = %call.name, error = ?result.error_kind(), "Tool reported failure");
                }
                let execution = ToolExecution {
                    iteration,
                    call: &call,
                    result: &result,
                    puzzle: dispatcher.puzzle(),
                    duration: call_started.elapsed(),
                };
                for listener in &self.listeners {
                    listener.on_tool_executed(&execution);
                }
            }
        };

        let puzzle = dispatcher.puzzle();
        let outcome = SolveOutcome {
            success: termination == Termination::Solved,
            iterations,
            tool_calls: dispatcher.call_count() - calls_before,
            filled: puzzle.filled_count(),
            total: puzzle.total_clues(),
            fill_ratio: puzzle.fill_ratio(),
            elapsed: started.elapsed(),
            termination,
        };
        info!(
            session_id = %self.session_id,
            success = outcome.success,
            iterations = outcome.iterations,
            tool_calls = outcome.tool_calls,
            filled = outcome.filled,
            total = outcome.total,
            termination = %outcome.termination,
            "Solve finished"
        );
        for listener in &self.listeners {
            listener.on_session_finished(&outcome, puzzle);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{PhaseTransition, SolverPhase};
    use crate::test_helpers::*;
    use crossclaw_core::error::ProviderError;
    use crossclaw_core::message::Role;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        tools: Mutex<Vec<(u32, String, bool)>>,
        phases: Mutex<Vec<PhaseTransition>>,
        finished: Mutex<Option<SolveOutcome>>,
    }

    impl SolveListener for Recorder {
        fn on_tool_executed(&self, execution: &ToolExecution<'_>) {
            self.tools.lock().unwrap().push((
                execution.iteration,
                execution.call.name.clone(),
                execution.result.success,
            ));
        }
        fn on_phase_changed(&self, transition: PhaseTransition, _iteration: u32) {
            self.phases.lock().unwrap().push(transition);
        }
        fn on_session_finished(&self, outcome: &SolveOutcome, _puzzle: &Puzzle) {
            *self.finished.lock().unwrap() = Some(outcome.clone());
        }
    }

    #[tokio::test]
    async fn solves_in_two_turns() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![set_answer_call("c1", 1, "across", "CAT")]),
            make_tool_call_response(vec![
                set_answer_call("c2", 1, "down", "COW"),
                validate_call("c3", 1, "down"),
            ]),
        ]));
        let recorder = Arc::new(Recorder::default());
        let solver = CrosswordSolver::new(provider.clone(), "mock").with_listener(recorder.clone());
        let mut dispatcher = solver.dispatcher_for(fixture());

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(outcome.success);
        assert_eq!(outcome.termination, Termination::Solved);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.tool_calls, 3);
        assert_eq!(outcome.filled, 2);
        assert!((outcome.fill_ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(provider.call_count(), 2);

        let tools = recorder.tools.lock().unwrap();
        assert_eq!(tools[0], (0, "set_answer".to_string(), true));
        assert_eq!(tools[2], (1, "validate_clue".to_string(), true));
        assert!(recorder.finished.lock().unwrap().as_ref().unwrap().success);
    }

    #[tokio::test]
    async fn context_starts_with_system_and_puzzle() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(vec![
            set_answer_call("c1", 1, "across", "CAT"),
            set_answer_call("c2", 1, "down", "COW"),
        ])]));
        let solver = CrosswordSolver::new(provider.clone(), "mock");
        let mut dispatcher = solver.dispatcher_for(fixture());
        solver.solve(&mut dispatcher).await;

        let request = provider.request(0).unwrap();
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("constrained_solving"));
        assert!(request.messages[1].content.contains("Feline pet"));
        assert_eq!(request.tools.len(), 8);
        assert!(!request.json_mode);
    }

    #[tokio::test]
    async fn silence_gets_a_reminder() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("I think I'm done."),
            make_tool_call_response(vec![
                set_answer_call("c1", 1, "across", "CAT"),
                set_answer_call("c2", 1, "down", "COW"),
            ]),
        ]));
        let solver = CrosswordSolver::new(provider.clone(), "mock");
        let mut dispatcher = solver.dispatcher_for(fixture());

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(outcome.success);
        let second = provider.request(1).unwrap();
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("2 clues remain"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported_back() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![raw_call("c1", "set_answer", r#"{"clue_number": 1,"#)]),
            make_tool_call_response(vec![
                set_answer_call("c2", 1, "across", "CAT"),
                set_answer_call("c3", 1, "down", "COW"),
            ]),
        ]));
        let solver = CrosswordSolver::new(provider.clone(), "mock");
        let mut dispatcher = solver.dispatcher_for(fixture());

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(outcome.success);
        assert_eq!(outcome.tool_calls, 3);

        let second = provider.request(1).unwrap();
        let feedback = second.messages.last().unwrap();
        assert_eq!(feedback.role, Role::Tool);
        assert_eq!(feedback.tool_call_id.as_deref(), Some("c1"));
        let content: serde_json::Value = serde_json::from_str(&feedback.content).unwrap();
        assert_eq!(content["success"], false);
        assert_eq!(content["error"], "malformed_arguments");
    }

    #[tokio::test]
    async fn budget_exhaustion_is_a_bounded_failure() {
        let provider = Arc::new(
            SequentialMockProvider::new(vec![make_tool_call_response(vec![set_answer_call(
                "c1", 1, "across", "CAT",
            )])])
            .then_repeat(make_text_response("thinking")),
        );
        let recorder = Arc::new(Recorder::default());
        let solver = CrosswordSolver::new(provider.clone(), "mock")
            .with_max_iterations(20)
            .with_listener(recorder.clone());
        let mut dispatcher = solver.dispatcher_for(fixture());

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(!outcome.success);
        assert_eq!(outcome.termination, Termination::IterationBudget);
        assert_eq!(outcome.iterations, 20);
        assert_eq!(outcome.filled, 1);
        assert_eq!(provider.call_count(), 20);

        let phases = recorder.phases.lock().unwrap();
        assert_eq!(phases[0].to, SolverPhase::CandidateGeneration);
    }

    #[tokio::test]
    async fn phase_change_rebuilds_system_message() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_text_response("hmm")));
        let solver = CrosswordSolver::new(provider.clone(), "mock").with_max_iterations(6);
        let mut dispatcher = solver.dispatcher_for(fixture());
        solver.solve(&mut dispatcher).await;

        // Five silent turns complete before the sixth call sees the new phase
        for i in 0..5 {
            assert!(provider.request(i).unwrap().messages[0].content.contains("constrained_solving"));
        }
        assert!(provider.request(5).unwrap().messages[0].content.contains("candidate_generation"));
    }

    #[tokio::test]
    async fn prefilled_puzzle_starts_without_false_progress() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_text_response("hmm")));
        let recorder = Arc::new(Recorder::default());
        let solver = CrosswordSolver::new(provider.clone(), "mock")
            .with_max_iterations(6)
            .with_listener(recorder.clone());
        let mut puzzle = fixture();
        puzzle.set_clue_chars(crossclaw_puzzle::ClueId::across(1), &['C', 'A', 'T']).unwrap();
        let mut dispatcher = solver.dispatcher_for(puzzle);
        solver.solve(&mut dispatcher).await;

        let phases = recorder.phases.lock().unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].to, SolverPhase::CandidateGeneration);
        assert!(provider.request(5).unwrap().messages[0].content.contains("candidate_generation"));
    }

    #[tokio::test]
    async fn compression_collapses_history() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]).then_repeat(make_text_response("hmm")));
        let solver = CrosswordSolver::new(provider.clone(), "mock")
            .with_max_iterations(5)
            .with_compression(3, 4);
        let mut dispatcher = solver.dispatcher_for(fixture());
        solver.solve(&mut dispatcher).await;

        // Call #2 sees system + puzzle + two (reply, reminder) pairs
        assert_eq!(provider.request(2).unwrap().messages.len(), 6);
        // Iteration 3 compresses to system + digest
        let compressed = provider.request(3).unwrap();
        assert_eq!(compressed.messages.len(), 2);
        assert!(compressed.messages[1].content.starts_with("Progress so far"));
    }

    #[tokio::test]
    async fn backend_failure_ends_without_panic() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(vec![
            set_answer_call("c1", 1, "across", "CAT"),
        ])])
        .then_fail(ProviderError::AuthenticationFailed("bad key".into())));
        let solver = CrosswordSolver::new(provider, "mock");
        let mut dispatcher = solver.dispatcher_for(fixture());

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(!outcome.success);
        assert!(matches!(outcome.termination, Termination::BackendExhausted { .. }));
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.filled, 1);
        assert!(outcome.termination.to_string().starts_with("backend unavailable"));
    }

    #[tokio::test]
    async fn already_solved_puzzle_needs_no_backend() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let solver = CrosswordSolver::new(provider.clone(), "mock");
        let mut puzzle = fixture();
        puzzle.set_clue_chars(crossclaw_puzzle::ClueId::across(1), &['C', 'A', 'T']).unwrap();
        puzzle.set_clue_chars(crossclaw_puzzle::ClueId::down(1), &['C', 'O', 'W']).unwrap();
        let mut dispatcher = solver.dispatcher_for(puzzle);

        let outcome = solver.solve(&mut dispatcher).await;
        assert!(outcome.success);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn from_config_applies_solver_settings() {
        let mut config = AppConfig::default();
        config.default_model = "deploy-1".into();
        config.solver.max_iterations = 12;
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let solver = CrosswordSolver::from_config(provider, &config);
        assert_eq!(solver.model(), "deploy-1");
        assert_eq!(solver.max_iterations(), 12);
    }
}
