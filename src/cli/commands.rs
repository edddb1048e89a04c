use clap::{Parser, Subcommand};

use crate::core::{ConversationKey, Role};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(author, version, about = "Rate-limited chat relay for LLM completion APIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question without any history
    Chat {
        prompt: String,

        /// Override the configured system prompt
        #[arg(short = 's', long)]
        system: Option<String>,
    },

    /// Chat interactively within one conversation
    ///
    /// Local commands: /append <role> <text>, /clear, /clearall, /stats, /quit
    Interactive {
        /// Conversation to key history by: channel:<id> or user:<id>
        #[arg(short = 'k', long, default_value = "user:0")]
        key: ConversationKey,
    },
}

/// Slash commands understood by the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    /// Record a turn without asking for a completion.
    Append { role: Role, content: String },
    Clear,
    ClearAll,
    Stats,
    Quit,
    Invalid(String),
    Unknown(String),
}

impl LocalCommand {
    /// Returns `None` for ordinary chat input.
    pub fn parse(line: &str) -> Option<Self> {
        let command = line.trim().strip_prefix('/')?.trim();
        let (name, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));

        Some(match name.to_ascii_lowercase().as_str() {
            "append" => Self::parse_append(args),
            "clear" => LocalCommand::Clear,
            "clearall" => LocalCommand::ClearAll,
            "stats" => LocalCommand::Stats,
            "quit" | "exit" => LocalCommand::Quit,
            other => LocalCommand::Unknown(other.to_string()),
        })
    }

    fn parse_append(args: &str) -> Self {
        let args = args.trim();
        let (role, content) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let content = content.trim();
        if content.is_empty() {
            return LocalCommand::Invalid("usage: /append <role> <text>".to_string());
        }

        match role.parse::<Role>() {
            Ok(role) => LocalCommand::Append {
                role,
                content: content.to_string(),
            },
            Err(e) => LocalCommand::Invalid(e.to_string()),
        }
    }
}
