//! Configuration schema — the gateway's tunables as a typed structure.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.
//!
//! The attempt-loop constants (cycle count, attempt cap, request timeout,
//! connection retry delay) live here rather than as hard-coded invariants —
//! their defaults match the values the provider set was tuned against.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.coursechat/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub chat: ChatSettings,
    pub proxy: ProxyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat: ChatSettings::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Chat settings
// ─────────────────────────────────────────────

/// Attempt-loop tunables.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Full passes over the provider list per request.
    pub max_cycles: usize,
    /// Global cap on attempt-plan entries.
    pub max_attempts: usize,
    /// Per-attempt request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Pause after a connection error before the next attempt, milliseconds.
    /// Rate limits and timeouts never pause.
    pub connect_retry_delay_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_cycles: 3,
            max_attempts: 30,
            request_timeout_secs: 120,
            connect_retry_delay_ms: 100,
        }
    }
}

// ─────────────────────────────────────────────
// Proxy
// ─────────────────────────────────────────────

/// Outbound proxy. Disabled by default — direct connections work better
/// against most of the free backends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    /// Proxy URL (e.g. `http://host:port`). None = no proxy available.
    pub url: Option<String>,
    /// Whether requests should go through the proxy at startup.
    pub enabled: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: None,
            enabled: false,
        }
    }
}

impl ProxyConfig {
    /// A proxy can only be engaged when a URL is configured.
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
