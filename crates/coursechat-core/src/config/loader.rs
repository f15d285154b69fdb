//! Config loader — reads `~/.coursechat/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.coursechat/config.json`
//! 3. Environment variables `COURSECHAT_<SECTION>__<FIELD>` (override JSON)
//!
//! Any read or parse failure falls back to defaults with a warning — a
//! broken config file must never take the chat down.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `COURSECHAT_<SECTION>__<FIELD>` (double underscore as
/// delimiter).
///
/// Supported overrides:
/// - `COURSECHAT_CHAT__MAX_CYCLES` → `chat.max_cycles`
/// - `COURSECHAT_CHAT__MAX_ATTEMPTS` → `chat.max_attempts`
/// - `COURSECHAT_CHAT__REQUEST_TIMEOUT_SECS` → `chat.request_timeout_secs`
/// - `COURSECHAT_CHAT__CONNECT_RETRY_DELAY_MS` → `chat.connect_retry_delay_ms`
/// - `COURSECHAT_PROXY__URL` → `proxy.url`
/// - `COURSECHAT_PROXY__ENABLED` → `proxy.enabled`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("COURSECHAT_CHAT__MAX_CYCLES") {
        if let Ok(n) = val.parse::<usize>() {
            config.chat.max_cycles = n;
        }
    }
    if let Ok(val) = std::env::var("COURSECHAT_CHAT__MAX_ATTEMPTS") {
        if let Ok(n) = val.parse::<usize>() {
            config.chat.max_attempts = n;
        }
    }
    if let Ok(val) = std::env::var("COURSECHAT_CHAT__REQUEST_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.chat.request_timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("COURSECHAT_CHAT__CONNECT_RETRY_DELAY_MS") {
        if let Ok(n) = val.parse::<u64>() {
            config.chat.connect_retry_delay_ms = n;
        }
    }
    if let Ok(val) = std::env::var("COURSECHAT_PROXY__URL") {
        config.proxy.url = Some(val);
    }
    if let Ok(val) = std::env::var("COURSECHAT_PROXY__ENABLED") {
        config.proxy.enabled = val == "true" || val == "1";
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        // Should return defaults
        assert_eq!(config.chat.max_attempts, 30);
        assert_eq!(config.chat.request_timeout_secs, 120);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "chat": {
                "maxAttempts": 12,
                "requestTimeoutSecs": 60
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.chat.max_attempts, 12);
        assert_eq!(config.chat.request_timeout_secs, 60);
        // Default preserved
        assert_eq!(config.chat.max_cycles, 3);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.chat.max_attempts, 30);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.chat.max_cycles, 3);
        assert!(config.proxy.url.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.chat.max_attempts = 15;
        config.proxy.url = Some("http://10.0.0.1:8080".to_string());

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.chat.max_attempts, 15);
        assert_eq!(reloaded.proxy.url.as_deref(), Some("http://10.0.0.1:8080"));
    }

    #[test]
    fn test_env_override_max_attempts() {
        std::env::set_var("COURSECHAT_CHAT__MAX_ATTEMPTS", "7");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.chat.max_attempts, 7);
        std::env::remove_var("COURSECHAT_CHAT__MAX_ATTEMPTS");
    }

    #[test]
    fn test_env_override_proxy() {
        std::env::set_var("COURSECHAT_PROXY__URL", "http://proxy:3128");
        std::env::set_var("COURSECHAT_PROXY__ENABLED", "true");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.proxy.url.as_deref(), Some("http://proxy:3128"));
        assert!(config.proxy.enabled);
        std::env::remove_var("COURSECHAT_PROXY__URL");
        std::env::remove_var("COURSECHAT_PROXY__ENABLED");
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        std::env::set_var("COURSECHAT_CHAT__MAX_CYCLES", "not-a-number");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.chat.max_cycles, 3);
        std::env::remove_var("COURSECHAT_CHAT__MAX_CYCLES");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["chat"].get("maxCycles").is_some());
        assert!(raw["chat"].get("max_cycles").is_none());
    }
}
