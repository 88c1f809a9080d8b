//! Shared test helpers for the solver and session tests.

use crossclaw_core::error::ProviderError;
use crossclaw_core::message::{Message, MessageToolCall};
use crossclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use crossclaw_puzzle::Puzzle;
use std::sync::Mutex;

pub const FIXTURE: &str = r#"{
    "title": "Farmyard",
    "width": 3,
    "height": 3,
    "clues": [
        {"number": 1, "direction": "across", "text": "Feline pet", "row": 0, "col": 0, "answer": "CAT"},
        {"number": 1, "direction": "down", "text": "Dairy animal", "row": 0, "col": 0, "answer": "COW"}
    ]
}"#;

pub fn fixture() -> Puzzle {
    Puzzle::from_json(FIXTURE).unwrap()
}

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue. Once the
/// queue is empty the fallback is used; without one, the provider panics.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    fallback: Option<Result<ProviderResponse, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Keep returning `response` after the script runs out.
    pub fn then_repeat(mut self, response: ProviderResponse) -> Self {
        self.fallback = Some(Ok(response));
        self
    }

    /// Fail with `error` after the script runs out.
    pub fn then_fail(mut self, error: ProviderError) -> Self {
        self.fallback = Some(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The `index`th request received.
    pub fn request(&self, index: usize) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().get(index).cloned()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            return Ok(responses.remove(0));
        }
        match &self.fallback {
            Some(fallback) => fallback.clone(),
            None => panic!("SequentialMockProvider: no more responses (call #{call})"),
        }
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response carrying tool calls.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tools("", tool_calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool call with a verbatim argument string.
pub fn raw_call(id: &str, name: &str, arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}

pub fn set_answer_call(id: &str, number: u32, direction: &str, answer: &str) -> MessageToolCall {
    let args = serde_json::json!({"clue_number": number, "direction": direction, "answer": answer});
    raw_call(id, "set_answer", &args.to_string())
}

pub fn validate_call(id: &str, number: u32, direction: &str) -> MessageToolCall {
    let args = serde_json::json!({"clue_number": number, "direction": direction});
    raw_call(id, "validate_clue", &args.to_string())
}
