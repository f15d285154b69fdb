//! Gateway facade — the small stateful object the surrounding app talks to.
//!
//! Owns the registry, the shared [`GatewayState`], and the invoker. Chat
//! requests go through [`ChatGateway::send_message`]; everything else is the
//! administrative surface (inspect, change provider, shuffle, reset, proxy,
//! mode switches). Admin calls are synchronous, in-process, and not
//! transactional — concurrent writers race benignly, last one wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use coursechat_core::config::{ChatSettings, Config};
use coursechat_core::types::{ChatResult, HistoryPair};
use coursechat_providers::invoker::ProviderInvoker;
use coursechat_providers::registry::{fastest_recommended, find_spec, ProviderRegistry};
use coursechat_providers::HttpInvoker;

use crate::orchestrator::complete;
use crate::state::GatewayState;

/// The representative provider for deep mode — slower, better on hard
/// questions and code.
const DEEP_MODE_PROVIDER: &str = "Blackbox";

// ─────────────────────────────────────────────
// Introspection snapshot
// ─────────────────────────────────────────────

/// One row of the provider listing.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderEntry {
    pub name: String,
    pub tier: &'static str,
}

/// Point-in-time view of the gateway, for status output and admin UIs.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub current_provider: String,
    pub proxy_enabled: bool,
    pub proxy_configured: bool,
    pub working_count: usize,
    pub backup_count: usize,
    pub success_counts: HashMap<String, u64>,
    pub all: Vec<ProviderEntry>,
}

// ─────────────────────────────────────────────
// ChatGateway
// ─────────────────────────────────────────────

/// The chat gateway. One instance per process; shared across callers.
pub struct ChatGateway {
    registry: Mutex<ProviderRegistry>,
    state: GatewayState,
    invoker: Arc<dyn ProviderInvoker>,
    settings: ChatSettings,
    proxy_configured: bool,
}

impl ChatGateway {
    /// Build a gateway over an arbitrary invoker (tests pass fakes here).
    pub fn new(config: &Config, invoker: Arc<dyn ProviderInvoker>) -> Self {
        let proxy_configured = config.proxy.is_configured();
        ChatGateway {
            registry: Mutex::new(ProviderRegistry::recommended()),
            state: GatewayState::new(
                fastest_recommended(),
                config.proxy.enabled && proxy_configured,
            ),
            invoker,
            settings: config.chat.clone(),
            proxy_configured,
        }
    }

    /// Build a gateway with the real HTTP invoker.
    pub fn from_config(config: &Config) -> Self {
        let invoker = HttpInvoker::new(config.proxy.url.as_deref());
        Self::new(config, Arc::new(invoker))
    }

    /// Run one chat request: full history pass-through, provider rotation,
    /// formatted result.
    pub async fn send_message(&self, message: &str, history: &[HistoryPair]) -> ChatResult {
        let providers = self.lock_registry().all_providers();
        complete(
            self.invoker.as_ref(),
            &providers,
            &self.state,
            &self.settings,
            message,
            history,
        )
        .await
    }

    // ── Administrative surface ──

    /// Snapshot for introspection.
    pub fn get_info(&self) -> GatewayInfo {
        let registry = self.lock_registry();
        let all = registry
            .all_providers()
            .into_iter()
            .map(|name| {
                let tier = find_spec(&name).map(|s| s.tier.as_str()).unwrap_or("unknown");
                ProviderEntry { name, tier }
            })
            .collect();

        GatewayInfo {
            current_provider: self.state.current_provider(),
            proxy_enabled: self.state.proxy_enabled(),
            proxy_configured: self.proxy_configured,
            working_count: registry.working_providers().len(),
            backup_count: registry.slow().len(),
            success_counts: self.state.success_counts(),
            all,
        }
    }

    /// Point the rotation at `name`. Returns false (and changes nothing)
    /// when the name is not in the registry.
    pub fn change_provider(&self, name: &str) -> bool {
        if self.lock_registry().contains(name) {
            self.state.set_current_provider(name);
            info!(provider = name, "provider changed");
            true
        } else {
            warn!(provider = name, "unknown provider, keeping current");
            false
        }
    }

    /// Randomize the fast and medium rotation orders.
    pub fn shuffle_providers(&self) {
        self.lock_registry().shuffle();
        info!("provider order shuffled");
    }

    /// Restore the verified baseline ordering and point the rotation back
    /// at the fastest entry.
    pub fn reset_to_recommended(&self) {
        self.lock_registry().reset_to_recommended();
        self.state.set_current_provider(fastest_recommended());
        info!("providers reset to recommended");
    }

    /// Toggle (or set) proxied dispatch. Returns the new flag. The flag only
    /// has an effect when a proxy URL is configured.
    pub fn toggle_proxy(&self, explicit: Option<bool>) -> bool {
        self.state.toggle_proxy(explicit)
    }

    /// Fast mode: the quickest provider, direct connections.
    pub fn set_fast_mode(&self) {
        self.state.set_current_provider(fastest_recommended());
        self.state.set_proxy_enabled(false);
        info!("fast mode");
    }

    /// Deep mode: the heavier representative; optionally through the proxy.
    pub fn set_deep_mode(&self, use_proxy: bool) {
        self.state.set_current_provider(DEEP_MODE_PROVIDER);
        if use_proxy && self.proxy_configured {
            self.state.set_proxy_enabled(true);
        }
        info!(proxy = use_proxy, "deep mode");
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, ProviderRegistry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
