//! Chatrelay - rate-limited chat relay for LLM completion APIs
//!
//! This library keeps a bounded rolling history per conversation and
//! forwards it to an OpenRouter-compatible completion endpoint under a
//! global request budget, retrying transient failures with backoff.

mod config;
pub mod core;
pub mod storage;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::Relay;
pub use crate::config::{
    HistoryConfig, LLMConfig, LoggingConfig, RateLimitConfig, ReplyConfig, RetryConfig, Settings,
};

pub use crate::core::{
    AttemptFailure, CompletionClient, CompletionError, CompletionTransport, ConversationKey,
    HttpTransport, RequestLedger, Role, Turn,
};
pub use storage::{ConversationStats, ConversationStore};
