//! Relay facade
//!
//! This module ties the conversation store to the completion client so a
//! messaging front-end only has to hand over `(key, text)` and post back
//! whatever comes out.

use crate::config::Settings;
use crate::core::{CompletionClient, CompletionError, ConversationKey, Role};
use crate::storage::{ConversationStats, ConversationStore};
use std::sync::Arc;

/// Conversation store plus completion client, shared across chat handlers.
///
/// # Example
/// ```no_run
/// use chatrelay::{ConversationKey, Relay, Settings};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let relay = Relay::from_settings(Settings::new()?, Settings::api_key()?);
///     let key = ConversationKey::Channel(42);
///     match relay.respond(key, "What is Rust?").await {
///         Ok(reply) => println!("{}", reply),
///         Err(e) => println!("{}", e.user_message()),
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Relay {
    store: Arc<ConversationStore>,
    client: Arc<CompletionClient>,
}

impl Relay {
    pub fn new(store: Arc<ConversationStore>, client: Arc<CompletionClient>) -> Self {
        Self { store, client }
    }

    pub fn from_settings(settings: Settings, api_key: String) -> Self {
        let store = Arc::new(ConversationStore::new(settings.history.max_turns));
        let client = Arc::new(CompletionClient::new(api_key, settings));
        Self::new(store, client)
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<CompletionClient> {
        &self.client
    }

    /// Record a user turn, complete the conversation, and record the reply.
    ///
    /// On failure the user turn stays in history and no assistant turn is added.
    pub async fn respond(
        &self,
        key: ConversationKey,
        text: impl Into<String>,
    ) -> Result<String, CompletionError> {
        self.store.append(key, Role::User, text);
        let context = self.store.context(key);

        let reply = self.client.complete(&context).await?;
        self.store.append(key, Role::Assistant, reply.as_str());

        tracing::info!("Responded in conversation '{}'", key);
        Ok(reply)
    }

    /// One-off question that leaves every history untouched.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String, CompletionError> {
        self.client.ask(question).await
    }

    pub fn clear(&self, key: ConversationKey) {
        self.store.clear(key);
    }

    pub fn clear_all(&self) {
        self.store.clear_all();
    }

    pub fn stats(&self) -> ConversationStats {
        self.store.stats()
    }
}
