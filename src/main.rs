use anyhow::Result;
use chatrelay::cli::{Cli, Commands, LocalCommand};
use chatrelay::{utils, ConversationKey, Relay, Settings, Turn};
use clap::Parser;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let api_key = Settings::api_key()?;
    let max_length = settings.reply.max_length;
    let relay = Relay::from_settings(settings, api_key);

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { prompt, system } => handle_chat(&relay, prompt, system, max_length).await,
        Commands::Interactive { key } => handle_interactive(&relay, key, max_length).await,
    }
}

async fn handle_chat(
    relay: &Relay,
    prompt: String,
    system: Option<String>,
    max_length: usize,
) -> Result<()> {
    utils::print_info("Sending request...");

    let result = match system {
        Some(sys) => {
            relay
                .client()
                .complete(&[Turn::system(sys), Turn::user(prompt)])
                .await
        }
        None => relay.ask(prompt).await,
    };

    match result {
        Ok(reply) => {
            println!();
            utils::print_reply(&reply, max_length);
        }
        Err(e) => {
            tracing::error!("Completion failed: {}", e);
            utils::print_error(&e.user_message());
        }
    }
    Ok(())
}

async fn handle_interactive(
    relay: &Relay,
    key: ConversationKey,
    max_length: usize,
) -> Result<()> {
    utils::print_header(&format!("Interactive Mode ({})", key));
    utils::print_info("Type your messages (/append <role> <text>, /clear, /clearall, /stats, /quit)");
    utils::print_info("Note: history is kept in memory only\n");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = LocalCommand::parse(input) {
            match command {
                LocalCommand::Append { role, content } => {
                    relay.store().append(key, role, content);
                    utils::print_success(&format!("Recorded {} turn", role));
                }
                LocalCommand::Clear => {
                    relay.clear(key);
                    utils::print_success("Chat history cleared!");
                }
                LocalCommand::ClearAll => {
                    relay.clear_all();
                    utils::print_success("All chat histories cleared!");
                }
                LocalCommand::Stats => utils::print_stats(&relay.stats()),
                LocalCommand::Quit => break,
                LocalCommand::Invalid(reason) => utils::print_error(&reason),
                LocalCommand::Unknown(name) => {
                    utils::print_error(&format!("Unknown command: /{}", name))
                }
            }
            continue;
        }

        utils::print_info("Assistant: ");
        match relay.respond(key, input).await {
            Ok(reply) => utils::print_reply(&reply, max_length),
            Err(e) => {
                tracing::warn!("No reply for '{}': {}", key, e);
                utils::print_error(&e.user_message());
            }
        }
        println!();
    }

    Ok(())
}
