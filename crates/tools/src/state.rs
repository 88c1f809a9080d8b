//! Per-session state the tools operate on.

use crossclaw_config::CandidateConfig;
use crossclaw_core::provider::Provider;
use crossclaw_puzzle::{ClueId, Puzzle};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Backend settings for `generate_candidates`.
#[derive(Clone)]
pub struct CandidateBackend {
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub temperature: f32,
    pub default_count: usize,
    pub max_count: usize,
}

impl CandidateBackend {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self::from_config(provider, model, &CandidateConfig::default())
    }

    pub fn from_config(provider: Arc<dyn Provider>, model: impl Into<String>, config: &CandidateConfig) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: config.temperature,
            default_count: config.default_count,
            max_count: config.max_count,
        }
    }

    /// Requested count, defaulted and clamped to `1..=max_count`.
    pub fn clamp_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_count)
            .clamp(1, self.max_count.max(1))
    }
}

/// Everything one solving session's tools read and write.
pub struct SolveState {
    pub puzzle: Puzzle,
    /// Answers ever submitted per clue; never cleared
    attempts: HashMap<ClueId, BTreeSet<String>>,
    candidate_cache: HashMap<ClueId, Vec<String>>,
    pub(crate) candidates: Option<CandidateBackend>,
}

impl SolveState {
    pub fn new(puzzle: Puzzle) -> Self {
        Self {
            puzzle,
            attempts: HashMap::new(),
            candidate_cache: HashMap::new(),
            candidates: None,
        }
    }

    /// Remember an attempt. Returns `false` if it was already tried.
    pub fn record_attempt(&mut self, id: ClueId, answer: &str) -> bool {
        self.attempts.entry(id).or_default().insert(answer.to_string())
    }

    pub fn has_attempted(&self, id: ClueId, answer: &str) -> bool {
        self.attempts.get(&id).is_some_and(|set| set.contains(answer))
    }

    /// Attempts for a clue, alphabetically.
    pub fn attempts(&self, id: ClueId) -> Vec<String> {
        self.attempts
            .get(&id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn cached_candidates(&self, id: ClueId) -> Option<&[String]> {
        self.candidate_cache.get(&id).map(Vec::as_slice)
    }

    pub(crate) fn cache_candidates(&mut self, id: ClueId, candidates: Vec<String>) {
        if !candidates.is_empty() {
            self.candidate_cache.insert(id, candidates);
        }
    }

    pub fn candidate_backend(&self) -> Option<&CandidateBackend> {
        self.candidates.as_ref()
    }
}
