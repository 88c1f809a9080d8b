//! Error types for the CrossClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all CrossClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Puzzle errors ---
    #[error("Puzzle error: {0}")]
    Puzzle(#[from] PuzzleError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider output: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Whether the failure is a rate limit or a transient network condition
    /// that is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Server-provided wait hint, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }
}

/// Errors raised by the puzzle engine.
///
/// Clue identities are carried in their display form (`"3-down"`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    #[error("Answer length {actual} doesn't match clue {clue} length {expected}")]
    LengthMismatch {
        clue: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{letter}' is not a letter (clue {clue})")]
    InvalidLetter { clue: String, letter: char },

    #[error("Nothing to undo")]
    EmptyHistory,

    #[error("Clue {0} not found")]
    ClueNotFound(String),

    #[error("Invalid puzzle source: {0}")]
    InvalidSource(String),
}

impl PuzzleError {
    /// Stable machine-readable kind, reported to the backend in tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::InvalidLetter { .. } => "invalid_letter",
            Self::EmptyHistory => "empty_history",
            Self::ClueNotFound(_) => "clue_not_found",
            Self::InvalidSource(_) => "invalid_source",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Already tried '{answer}' for {clue}. Try a different answer.")]
    DuplicateAttempt { clue: String, answer: String },

    #[error("{0}")]
    Puzzle(#[from] PuzzleError),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

impl ToolError {
    /// Stable machine-readable kind, reported to the backend in tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "unknown_tool",
            Self::InvalidArguments(_) => "malformed_arguments",
            Self::DuplicateAttempt { .. } => "duplicate_attempt",
            Self::Puzzle(e) => e.kind(),
            Self::ExecutionFailed { .. } => "execution_failed",
        }
    }
}
