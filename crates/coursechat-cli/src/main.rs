//! Coursechat CLI — entry point.
//!
//! # Commands
//!
//! - `coursechat chat [-m MESSAGE]` — talk to the gateway (single-shot or REPL)
//! - `coursechat init` — write the starter config file
//! - `coursechat status` — show configuration and the provider table

mod helpers;
mod repl;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

use coursechat_core::config::load_config;
use coursechat_gateway::ChatGateway;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 💬 Coursechat — chat over free completion backends with rotation
#[derive(Parser)]
#[command(name = "coursechat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the gateway (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Write the starter config file (keeps an existing one)
    Init,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { message, logs } => {
            init_logging(logs);
            run_chat(message).await
        }
        Commands::Init => run_init(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Init command
// ─────────────────────────────────────────────

fn run_init() -> Result<()> {
    use coursechat_core::config::{get_config_path, save_config, Config};

    let path = get_config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    save_config(&Config::default(), None)?;
    println!("Wrote starter config to {}", path.display());
    println!("Edit it to set a proxy URL or tune the attempt loop.");
    Ok(())
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>) -> Result<()> {
    let config = load_config(None);
    let gateway = ChatGateway::from_config(&config);

    match message {
        Some(msg) => {
            // Single-shot mode
            let result = gateway.send_message(&msg, &[]).await;
            if result.success {
                helpers::print_response(
                    &result.response_text,
                    result.provider_used.as_deref(),
                    result.elapsed_seconds,
                );
            } else {
                helpers::print_failure(&result.response_text, result.attempt_count);
                std::process::exit(1);
            }
        }
        None => {
            // Interactive REPL mode
            repl::run(gateway).await?;
        }
    }

    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("coursechat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
