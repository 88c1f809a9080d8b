//! LLM Provider implementations for CrossClaw.
//!
//! All providers implement the `crossclaw_core::Provider` trait.
//! The router selects the correct provider based on configuration, and
//! `RetryProvider` wraps any of them with backoff on transient failures.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::{RetryPolicy, RetryProvider};
pub use router::{ProviderRouter, build_from_config};
