//! Gateway state — the shared, advisory rotation hint.
//!
//! One instance lives for the process. It remembers which provider answered
//! last (the rotation's starting point), per-provider success counters, and
//! whether the proxy is engaged. Consistency is deliberately weak: concurrent
//! chats may race on the pointer and counters, and the last write wins. The
//! mutex only prevents data-race UB; it provides no ordering. Nothing here is
//! correctness-critical — a stale pointer just starts the rotation one
//! provider off.

use std::collections::HashMap;
use std::sync::Mutex;

/// Shared mutable gateway state. Cheap to lock, never held across awaits.
#[derive(Debug)]
pub struct GatewayState {
    inner: Mutex<StateInner>,
}

#[derive(Debug)]
struct StateInner {
    current_provider: String,
    success_counts: HashMap<String, u64>,
    proxy_enabled: bool,
}

impl GatewayState {
    /// Create state pointing at `current_provider`, with the proxy flag as
    /// configured.
    pub fn new(current_provider: impl Into<String>, proxy_enabled: bool) -> Self {
        GatewayState {
            inner: Mutex::new(StateInner {
                current_provider: current_provider.into(),
                success_counts: HashMap::new(),
                proxy_enabled,
            }),
        }
    }

    /// The provider the next rotation starts from.
    pub fn current_provider(&self) -> String {
        self.lock().current_provider.clone()
    }

    /// Move the rotation pointer.
    pub fn set_current_provider(&self, name: impl Into<String>) {
        self.lock().current_provider = name.into();
    }

    /// Record a successful answer: bump the provider's counter and make it
    /// the rotation's new starting point.
    pub fn record_success(&self, provider: &str) {
        let mut inner = self.lock();
        *inner.success_counts.entry(provider.to_string()).or_insert(0) += 1;
        inner.current_provider = provider.to_string();
    }

    pub fn proxy_enabled(&self) -> bool {
        self.lock().proxy_enabled
    }

    pub fn set_proxy_enabled(&self, enabled: bool) {
        self.lock().proxy_enabled = enabled;
    }

    /// Toggle the proxy. `Some(value)` sets it explicitly, `None` flips it.
    /// Returns the new value.
    pub fn toggle_proxy(&self, explicit: Option<bool>) -> bool {
        let mut inner = self.lock();
        inner.proxy_enabled = explicit.unwrap_or(!inner.proxy_enabled);
        inner.proxy_enabled
    }

    /// Snapshot of the per-provider success counters.
    pub fn success_counts(&self) -> HashMap<String, u64> {
        self.lock().success_counts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StateInner> {
        // A poisoned lock means a panic mid-update of advisory data;
        // the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
