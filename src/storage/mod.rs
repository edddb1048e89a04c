//! Conversation history
//!
//! Information Hiding:
//! - Ring-buffer eviction hidden behind append()
//! - Callers only ever see owned snapshots of a conversation

pub mod memory;

pub use memory::{ConversationStats, ConversationStore};
