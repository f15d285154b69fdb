//! Provider invocation — the trait the gateway dispatches attempts through.
//!
//! Every backend call goes through [`ProviderInvoker::invoke`]. Failures come
//! back as a tagged [`InvokeError`], classified exactly once at this boundary;
//! the attempt loop switches on the variant instead of inspecting error text.

use std::time::Duration;

use async_trait::async_trait;
use coursechat_core::types::ConversationTurn;

/// Why a single provider invocation failed.
///
/// The variants carry the gateway's policy distinctions: rate limits are
/// skipped for the rest of the cycle, connection errors earn a short pause,
/// everything else just moves the rotation along.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvokeError {
    /// HTTP 429 or an explicit throttle notice from the backend.
    #[error("rate limited")]
    RateLimited,

    /// The request exceeded its deadline.
    #[error("timed out")]
    Timeout,

    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP 403 — the backend refuses this client outright.
    #[error("blocked: {0}")]
    Blocked(String),

    /// Anything unclassified: bad payloads, 5xx, unknown provider names.
    #[error("{0}")]
    Other(String),
}

/// Per-attempt invocation parameters, decided by the orchestrator.
#[derive(Clone, Debug)]
pub struct InvokeOptions {
    /// Hard deadline for the round trip.
    pub timeout: Duration,
    /// Route through the configured proxy for this attempt.
    pub use_proxy: bool,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            use_proxy: false,
        }
    }
}

/// Capability to call one named provider with a prepared prompt context.
///
/// The one network round trip per attempt happens inside `invoke`; it is the
/// attempt loop's sole suspension point. An empty completion is returned as
/// `Ok("")` — emptiness is the caller's classification, not the invoker's.
#[async_trait]
pub trait ProviderInvoker: Send + Sync {
    /// Send the full conversation to `provider` and return its raw text.
    async fn invoke(
        &self,
        provider: &str,
        turns: &[ConversationTurn],
        opts: &InvokeOptions,
    ) -> Result<String, InvokeError>;
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(InvokeError::RateLimited.to_string(), "rate limited");
        assert_eq!(InvokeError::Timeout.to_string(), "timed out");
        assert_eq!(
            InvokeError::Connection("refused".into()).to_string(),
            "connection failed: refused"
        );
        assert_eq!(
            InvokeError::Blocked("403 Forbidden".into()).to_string(),
            "blocked: 403 Forbidden"
        );
    }

    #[test]
    fn test_default_options() {
        let opts = InvokeOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(120));
        assert!(!opts.use_proxy);
    }
}
