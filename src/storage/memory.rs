//! In-Memory Conversation Store
//!
//! Information Hiding:
//! - Sharded map of per-key ring buffers hidden behind a synchronous API
//! - Same-key mutations serialize on the key's shard lock, other keys run in parallel
//! - Data is lost when the process terminates

use crate::core::turn::{ConversationKey, Role, Turn};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;

/// Bounded, chronologically ordered turns of one conversation.
#[derive(Debug, Default)]
struct ConversationLog {
    turns: VecDeque<Turn>,
}

impl ConversationLog {
    fn push(&mut self, turn: Turn, max_turns: usize) {
        while self.turns.len() >= max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }
}

/// Counts for observability. Computed from a read-only pass over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConversationStats {
    pub keys: usize,
    pub total_turns: usize,
    pub max_turns: usize,
    pub channel_keys: usize,
    pub user_keys: usize,
    pub channel_turns: usize,
    pub user_turns: usize,
}

/// Per-conversation history holding at most `max_turns` turns per key.
///
/// Appending to a full log evicts its oldest turn, whatever its role. An
/// injected system turn therefore ages out like any other.
#[derive(Debug)]
pub struct ConversationStore {
    logs: DashMap<ConversationKey, ConversationLog>,
    max_turns: usize,
}

impl ConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            logs: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn append(&self, key: ConversationKey, role: Role, content: impl Into<String>) {
        self.append_turn(key, Turn::new(role, content));
    }

    pub fn append_turn(&self, key: ConversationKey, turn: Turn) {
        let mut log = self.logs.entry(key).or_default();
        log.push(turn, self.max_turns);
        tracing::debug!(
            "[ConversationStore] Appended turn to '{}' ({} held)",
            key,
            log.turns.len()
        );
    }

    /// Snapshot of the turns for `key`, oldest first. Unseen keys yield an
    /// empty list and are not created.
    pub fn context(&self, key: ConversationKey) -> Vec<Turn> {
        self.logs
            .get(&key)
            .map(|log| log.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, key: ConversationKey) -> usize {
        self.logs.get(&key).map(|log| log.turns.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn keys(&self) -> Vec<ConversationKey> {
        self.logs.iter().map(|entry| *entry.key()).collect()
    }

    pub fn clear(&self, key: ConversationKey) {
        if self.logs.remove(&key).is_some() {
            tracing::debug!("[ConversationStore] Cleared history for '{}'", key);
        }
    }

    pub fn clear_all(&self) {
        let dropped = self.logs.len();
        self.logs.clear();
        tracing::info!("[ConversationStore] Cleared all histories ({} conversations)", dropped);
    }

    pub fn stats(&self) -> ConversationStats {
        let mut stats = ConversationStats {
            max_turns: self.max_turns,
            ..Default::default()
        };

        for entry in self.logs.iter() {
            let turns = entry.value().turns.len();
            stats.keys += 1;
            stats.total_turns += turns;
            if entry.key().is_channel() {
                stats.channel_keys += 1;
                stats.channel_turns += turns;
            } else {
                stats.user_keys += 1;
                stats.user_turns += turns;
            }
        }

        stats
    }
}
