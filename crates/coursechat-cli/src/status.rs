//! `coursechat status` — show configuration and the provider table.

use anyhow::Result;
use colored::Colorize;

use coursechat_core::config::{get_config_path, load_config};
use coursechat_providers::registry::{
    BLOCKED, RECOMMENDED_FAST, RECOMMENDED_MEDIUM, RECOMMENDED_SLOW,
};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "💬 Coursechat Status".cyan().bold());
    println!();

    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    println!(
        "  {:<18} {}",
        "Attempts:".bold(),
        format!(
            "{} max, {} cycles, {}s timeout",
            config.chat.max_attempts, config.chat.max_cycles, config.chat.request_timeout_secs
        )
        .dimmed()
    );

    let proxy_status = match (&config.proxy.url, config.proxy.enabled) {
        (Some(url), true) => format!("{} {}", url, "(enabled)".green()),
        (Some(url), false) => format!("{} {}", url, "(disabled)".dimmed()),
        (None, _) => format!("{}", "· not configured".dimmed()),
    };
    println!("  {:<18} {}", "Proxy:".bold(), proxy_status);

    println!();
    println!("  {}", "Providers:".bold());
    for (label, specs) in [
        ("fast", RECOMMENDED_FAST),
        ("medium", RECOMMENDED_MEDIUM),
        ("slow", RECOMMENDED_SLOW),
    ] {
        for spec in specs {
            println!(
                "    {:<28} {:<8} {}",
                spec.name,
                label,
                spec.note.dimmed()
            );
        }
    }

    println!();
    println!("  {}", "Blocked:".bold());
    for blocked in BLOCKED {
        println!(
            "    {:<28} {}",
            blocked.name.dimmed(),
            blocked.reason.dimmed()
        );
    }

    println!();
    Ok(())
}
