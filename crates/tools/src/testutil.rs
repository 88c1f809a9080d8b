//! Shared fixtures for the tool tests.

use crate::state::SolveState;
use async_trait::async_trait;
use crossclaw_core::error::ProviderError;
use crossclaw_core::message::Message;
use crossclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
use crossclaw_puzzle::{ClueId, Direction, Puzzle};
use std::sync::{Arc, Mutex};

pub const FIXTURE: &str = r#"{
    "title": "Farmyard",
    "width": 3,
    "height": 3,
    "clues": [
        {"number": 1, "direction": "across", "text": "Feline pet", "row": 0, "col": 0, "length": 3, "answer": "CAT"},
        {"number": 1, "direction": "down", "text": "Dairy animal", "row": 0, "col": 0, "length": 3, "answer": "COW"}
    ]
}"#;

pub const CAT: ClueId = ClueId { number: 1, direction: Direction::Across };
pub const COW: ClueId = ClueId { number: 1, direction: Direction::Down };

pub fn puzzle() -> Puzzle {
    Puzzle::from_json(FIXTURE).unwrap()
}

pub fn state() -> SolveState {
    SolveState::new(puzzle())
}

/// Replays canned replies in order and records every request.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replying(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(vec![Err(error)]),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(ProviderError::Malformed("script exhausted".into()));
        }
        replies.remove(0).map(|content| ProviderResponse {
            message: Message::assistant(content),
            usage: None,
            model: "scripted".into(),
        })
    }
}
