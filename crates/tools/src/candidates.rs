//! generate_candidates: ask the backend for possible answers to one clue.
//!
//! This is a separate, stateless request with its own higher temperature. It
//! never touches the solver's conversation. Results are filtered against the
//! grid and the attempt memory, then cached per clue.

use crate::args::{ClueArgs, clue_schema, decode};
use crate::registry::Tool;
use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::{ProviderError, ToolError};
use crossclaw_core::message::Message;
use crossclaw_core::provider::ProviderRequest;
use crossclaw_core::tool::ToolResult;
use crossclaw_puzzle::{Clue, ClueId, Puzzle};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct GenerateCandidatesTool;

#[derive(Deserialize)]
struct Args {
    #[serde(flatten)]
    clue: ClueArgs,
    #[serde(default)]
    count: Option<usize>,
}

const SYSTEM_PROMPT: &str = "You are a crossword expert. Reply with a single JSON object and nothing else.";

#[async_trait]
impl Tool for GenerateCandidatesTool {
    fn name(&self) -> &str {
        "generate_candidates"
    }

    fn description(&self) -> &str {
        "Generate candidate answers for a clue that fit its length and the letters already placed. \
         Use this when you are stuck on a clue."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        clue_schema(
            &[(
                "count",
                serde_json::json!({ "type": "integer", "description": "How many candidates to generate" }),
            )],
            &["count"],
        )
    }

    async fn execute(&self, state: &mut SolveState, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: Args = decode(self.name(), arguments)?;
        let id = args.clue.id();
        let clue = state.puzzle.clue(id)?.clone();

        // Re-checked against attempts and crossings made since caching
        if let Some(cached) = state.cached_candidates(id).map(<[String]>::to_vec) {
            let before = cached.len();
            let still_valid = filter_candidates(state, &clue, cached, before);
            if !still_valid.is_empty() {
                let rejected = before - still_valid.len();
                debug!(clue = %id, count = still_valid.len(), rejected, "Serving cached candidates");
                state.cache_candidates(id, still_valid.clone());
                return Ok(success(id, still_valid, true, rejected));
            }
            debug!(clue = %id, "Cached candidates are stale");
        }

        let backend = state.candidate_backend().cloned().ok_or_else(|| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: "candidate generation is not configured".into(),
        })?;
        let count = backend.clamp_count(args.count);
        let attempts = state.attempts(id);
        let prompt = build_prompt(&state.puzzle, &clue, count, &attempts)?;

        let mut request = ProviderRequest::new(
            backend.model.clone(),
            vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        );
        request.temperature = backend.temperature;
        request.json_mode = true;

        let raw = match backend.provider.complete(request).await {
            Ok(response) => parse_candidates(&response.message.content),
            Err(e) => Err(e),
        };
        let proposed = match raw {
            Ok(list) => list,
            Err(e) => {
                warn!(clue = %id, error = %e, "Candidate generation failed");
                let kind = match &e {
                    ProviderError::Malformed(_) => "backend_malformed",
                    _ => "backend_unavailable",
                };
                return Ok(ToolResult::failed(
                    format!("Could not generate candidates for {id}: {e}"),
                    serde_json::json!({
                        "error": kind,
                        "clue_number": id.number,
                        "direction": id.direction,
                        "candidates": [],
                    }),
                ));
            }
        };

        let offered = proposed.len();
        let accepted = filter_candidates(state, &clue, proposed, count);
        let rejected = offered - accepted.len();
        debug!(clue = %id, offered, accepted = accepted.len(), "Candidates generated");
        state.cache_candidates(id, accepted.clone());
        Ok(success(id, accepted, false, rejected))
    }
}

fn success(id: ClueId, candidates: Vec<String>, cached: bool, rejected: usize) -> ToolResult {
    let output = if candidates.is_empty() {
        format!("No compatible candidates for {id}")
    } else {
        format!("Candidates for {id}: {}", candidates.join(", "))
    };
    ToolResult::ok(
        output,
        serde_json::json!({
            "clue_number": id.number,
            "direction": id.direction,
            "candidates": candidates,
            "cached": cached,
            "rejected": rejected,
        }),
    )
}

fn build_prompt(puzzle: &Puzzle, clue: &Clue, count: usize, attempts: &[String]) -> Result<String, ToolError> {
    let pattern = puzzle.pattern(clue.id)?;
    let mut prompt = format!(
        "Generate {count} distinct candidate answers for this crossword clue.\n\
         Clue ({}): {}\n\
         Length: {} letters\n\
         Pattern: {pattern} (_ = unknown letter)\n",
        clue.id, clue.text, clue.length
    );
    if !attempts.is_empty() {
        prompt.push_str(&format!("Already tried, do not repeat: {}\n", attempts.join(", ")));
    }
    prompt.push_str("Respond with JSON: {\"candidates\": [\"ANSWER1\", \"ANSWER2\"]}");
    Ok(prompt)
}

/// Accepts `{"candidates": [..]}` or a bare array of strings.
fn parse_candidates(content: &str) -> Result<Vec<String>, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(content.trim())
        .map_err(|e| ProviderError::Malformed(format!("candidate output is not JSON: {e}")))?;
    let list = match &value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map
            .get("candidates")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::Malformed("missing 'candidates' array".into()))?,
        _ => return Err(ProviderError::Malformed("expected a JSON object or array".into())),
    };
    list.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ProviderError::Malformed("candidates must be strings".into()))
        })
        .collect()
}

/// Normalise, then keep length-correct, grid-compatible, untried, distinct entries.
fn filter_candidates(state: &SolveState, clue: &Clue, proposed: Vec<String>, count: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    proposed
        .into_iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| c.chars().count() == clue.length)
        .filter(|c| !state.has_attempted(clue.id, c))
        .filter(|c| {
            state
                .puzzle
                .check_compatibility(clue.id, c)
                .is_ok_and(|report| report.compatible)
        })
        .filter(|c| seen.insert(c.clone()))
        .take(count)
        .collect()
}
