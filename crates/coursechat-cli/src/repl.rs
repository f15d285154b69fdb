//! Interactive REPL — chat plus the administrative slash commands.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! The REPL owns the conversation history: successful exchanges are appended
//! as pairs and replayed in full on every request. The gateway never trims
//! them — if a session grows unwieldy, `/clear` starts over.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use coursechat_core::types::HistoryPair;
use coursechat_gateway::ChatGateway;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// What one REPL input means.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Help,
    Info,
    Providers,
    ChangeProvider(String),
    Shuffle,
    Reset,
    Proxy(Option<bool>),
    Fast,
    Deep,
    Clear,
    Unknown(String),
    Message(String),
}

/// Parse a trimmed, non-empty input line.
fn parse_command(input: &str) -> ReplCommand {
    if EXIT_COMMANDS.contains(&input.to_lowercase().as_str()) {
        return ReplCommand::Exit;
    }
    if !input.starts_with('/') {
        return ReplCommand::Message(input.to_string());
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/help" => ReplCommand::Help,
        "/info" => ReplCommand::Info,
        "/providers" => ReplCommand::Providers,
        "/provider" if !arg.is_empty() => ReplCommand::ChangeProvider(arg.to_string()),
        "/shuffle" => ReplCommand::Shuffle,
        "/reset" => ReplCommand::Reset,
        "/proxy" => match arg {
            "on" => ReplCommand::Proxy(Some(true)),
            "off" => ReplCommand::Proxy(Some(false)),
            _ => ReplCommand::Proxy(None),
        },
        "/fast" => ReplCommand::Fast,
        "/deep" => ReplCommand::Deep,
        "/clear" => ReplCommand::Clear,
        other => ReplCommand::Unknown(other.to_string()),
    }
}

/// Run the interactive REPL loop.
pub async fn run(gateway: ChatGateway) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;
    let mut history: Vec<HistoryPair> = Vec::new();

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        match parse_command(trimmed) {
            ReplCommand::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Info => print_info(&gateway),
            ReplCommand::Providers => print_providers(&gateway),
            ReplCommand::ChangeProvider(name) => {
                if gateway.change_provider(&name) {
                    println!("Provider changed to {}", name.green());
                } else {
                    println!("{} unknown provider: {}", "✗".red(), name);
                }
            }
            ReplCommand::Shuffle => {
                gateway.shuffle_providers();
                println!("Provider order shuffled.");
            }
            ReplCommand::Reset => {
                gateway.reset_to_recommended();
                println!(
                    "Providers reset. Current: {}",
                    gateway.get_info().current_provider.green()
                );
            }
            ReplCommand::Proxy(explicit) => {
                let enabled = gateway.toggle_proxy(explicit);
                println!("Proxy {}", if enabled { "enabled".green() } else { "disabled".yellow() });
            }
            ReplCommand::Fast => {
                gateway.set_fast_mode();
                println!("Fast mode: {}", gateway.get_info().current_provider.green());
            }
            ReplCommand::Deep => {
                gateway.set_deep_mode(true);
                println!("Deep mode: {}", gateway.get_info().current_provider.green());
            }
            ReplCommand::Clear => {
                history.clear();
                println!("Conversation cleared.");
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {cmd} (try /help)");
            }
            ReplCommand::Message(message) => {
                debug!(message = %message, history = history.len(), "sending");
                let result = gateway.send_message(&message, &history).await;
                if result.success {
                    helpers::print_response(
                        &result.response_text,
                        result.provider_used.as_deref(),
                        result.elapsed_seconds,
                    );
                    history.push(HistoryPair::new(message, result.response_text));
                } else {
                    helpers::print_failure(&result.response_text, result.attempt_count);
                }
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

fn print_help() {
    println!();
    println!("  /info            gateway snapshot (provider, proxy, stats)");
    println!("  /providers       list providers by tier");
    println!("  /provider NAME   rotate from NAME next");
    println!("  /shuffle         randomize fast/medium order");
    println!("  /reset           restore the recommended order");
    println!("  /proxy [on|off]  toggle proxied dispatch");
    println!("  /fast            fastest provider, direct connections");
    println!("  /deep            heavier provider, proxy if configured");
    println!("  /clear           forget this conversation");
    println!("  exit             leave");
    println!();
}

fn print_info(gateway: &ChatGateway) {
    let info = gateway.get_info();
    println!();
    println!("  {:<16} {}", "Current:".bold(), info.current_provider.green());
    println!(
        "  {:<16} {} configured: {}",
        "Proxy:".bold(),
        if info.proxy_enabled { "on" } else { "off" },
        info.proxy_configured
    );
    println!(
        "  {:<16} {} working, {} backup",
        "Providers:".bold(),
        info.working_count,
        info.backup_count
    );
    if !info.success_counts.is_empty() {
        let mut counts: Vec<_> = info.success_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        println!("  {}", "Successes:".bold());
        for (name, count) in counts {
            println!("    {:<28} {}", name, count);
        }
    }
    println!();
}

fn print_providers(gateway: &ChatGateway) {
    let info = gateway.get_info();
    println!();
    for entry in &info.all {
        let marker = if entry.name == info.current_provider {
            "→".green().to_string()
        } else {
            " ".to_string()
        };
        println!("  {} {:<28} {}", marker, entry.name, entry.tier.dimmed());
    }
    println!();
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    coursechat_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(parse_command("exit"), ReplCommand::Exit);
        assert_eq!(parse_command("EXIT"), ReplCommand::Exit);
        assert_eq!(parse_command("/quit"), ReplCommand::Exit);
        assert_eq!(parse_command(":q"), ReplCommand::Exit);
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_command("hello there"),
            ReplCommand::Message("hello there".to_string())
        );
    }

    #[test]
    fn provider_command_takes_a_name() {
        assert_eq!(
            parse_command("/provider Blackbox"),
            ReplCommand::ChangeProvider("Blackbox".to_string())
        );
        // Bare /provider is not a change request
        assert_eq!(
            parse_command("/provider"),
            ReplCommand::Unknown("/provider".to_string())
        );
    }

    #[test]
    fn proxy_command_modes() {
        assert_eq!(parse_command("/proxy on"), ReplCommand::Proxy(Some(true)));
        assert_eq!(parse_command("/proxy off"), ReplCommand::Proxy(Some(false)));
        assert_eq!(parse_command("/proxy"), ReplCommand::Proxy(None));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("/info"), ReplCommand::Info);
        assert_eq!(parse_command("/providers"), ReplCommand::Providers);
        assert_eq!(parse_command("/shuffle"), ReplCommand::Shuffle);
        assert_eq!(parse_command("/reset"), ReplCommand::Reset);
        assert_eq!(parse_command("/fast"), ReplCommand::Fast);
        assert_eq!(parse_command("/deep"), ReplCommand::Deep);
        assert_eq!(parse_command("/clear"), ReplCommand::Clear);
    }

    #[test]
    fn unknown_slash_command() {
        assert_eq!(
            parse_command("/frobnicate"),
            ReplCommand::Unknown("/frobnicate".to_string())
        );
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".coursechat"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }
}
