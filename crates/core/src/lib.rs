//! # CrossClaw Core
//!
//! Domain types, traits, and error definitions shared by every CrossClaw crate.
//! This crate has **zero framework dependencies**: it defines the seams the
//! rest of the workspace implements against.
//!
//! ## Design Philosophy
//!
//! The language-model backend is a trait here; concrete HTTP backends live in
//! `crossclaw-providers`. Tool wire types and the solver event feed are defined
//! here so the dispatcher, the orchestrator and any observer agree on one
//! vocabulary without depending on each other.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, PuzzleError, Result, ToolError};
pub use event::{EventBus, SolverEvent, SolverEventKind};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{ToolCall, ToolResult};
