use crate::storage::ConversationStats;
use crate::utils::chunk_reply;
use colored::*;
use std::io::Write;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}

/// Print a reply the way a chat front-end would post it: one message per chunk.
pub fn print_reply(reply: &str, max_length: usize) {
    for chunk in chunk_reply(reply, max_length) {
        println!("{}", chunk);
    }
}

pub fn print_stats(stats: &ConversationStats) {
    print_header("Chat Statistics");
    println!("{:<18} {}", "Total Channels".bold(), stats.channel_keys);
    println!("{:<18} {}", "Total Users".bold(), stats.user_keys);
    println!("{:<18} {}", "Channel Messages".bold(), stats.channel_turns);
    println!("{:<18} {}", "User Messages".bold(), stats.user_turns);
    println!("{:<18} {}", "Max History".bold(), stats.max_turns);
}
