//! Conversation primitives: roles, turns and conversation keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker of a turn. Only these three roles ever reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role '{0}', expected one of: system, user, assistant")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

/// One message in a conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Identifies one independent conversation: a shared channel or a private
/// conversation with a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationKey {
    Channel(u64),
    User(u64),
}

impl ConversationKey {
    pub fn is_channel(&self) -> bool {
        matches!(self, ConversationKey::Channel(_))
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKey::Channel(id) => write!(f, "channel:{}", id),
            ConversationKey::User(id) => write!(f, "user:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid conversation key '{0}', expected channel:<id> or user:<id>")]
pub struct InvalidKey(pub String);

impl FromStr for ConversationKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once(':').ok_or_else(|| InvalidKey(s.to_string()))?;
        let id: u64 = id.trim().parse().map_err(|_| InvalidKey(s.to_string()))?;

        match kind.trim() {
            "channel" => Ok(ConversationKey::Channel(id)),
            "user" => Ok(ConversationKey::User(id)),
            _ => Err(InvalidKey(s.to_string())),
        }
    }
}
