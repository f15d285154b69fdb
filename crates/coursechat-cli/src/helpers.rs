//! Shared CLI helpers — banner and response printing.

use colored::Colorize;

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "💬 Coursechat".cyan().bold(), version);
    println!("{}", "Type /help for commands, exit to quit.".dimmed());
    println!();
}

/// Print an assistant response to stdout.
pub fn print_response(response: &str, provider: Option<&str>, elapsed: Option<f64>) {
    println!();
    match (provider, elapsed) {
        (Some(p), Some(t)) => {
            println!("{} {}", "💬 Coursechat".cyan().bold(), format!("({p}, {t}s)").dimmed());
        }
        _ => println!("{}", "💬 Coursechat".cyan().bold()),
    }
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print a failure message.
pub fn print_failure(text: &str, attempts: usize) {
    eprintln!();
    eprintln!("{} {}", "❌".red(), text);
    eprintln!("{}", format!("({attempts} attempts made)").dimmed());
    eprintln!();
}
