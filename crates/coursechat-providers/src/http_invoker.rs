//! HTTP invoker — talks to the free backends over their OpenAI-compatible
//! `/chat/completions` endpoints via `reqwest`.
//!
//! This is where transport and status errors become a typed [`InvokeError`].
//! Classification happens here and nowhere else: the attempt loop never
//! looks at response bodies or error strings.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use coursechat_core::types::{ChatCompletionRequest, ChatCompletionResponse, ConversationTurn};

use crate::invoker::{InvokeError, InvokeOptions, ProviderInvoker};
use crate::registry::find_spec;

// ─────────────────────────────────────────────
// HttpInvoker
// ─────────────────────────────────────────────

/// A [`ProviderInvoker`] backed by `reqwest`.
///
/// Holds two connection-pooled clients: one direct, one routed through the
/// configured proxy. Which one serves an attempt is the orchestrator's call,
/// made per attempt via [`InvokeOptions::use_proxy`].
pub struct HttpInvoker {
    direct: reqwest::Client,
    proxied: Option<reqwest::Client>,
    /// When set, every provider is reached through this base URL instead of
    /// its own. Used with local aggregators and in tests.
    api_base_override: Option<String>,
}

impl std::fmt::Debug for HttpInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInvoker")
            .field("has_proxy", &self.proxied.is_some())
            .field("api_base_override", &self.api_base_override)
            .finish()
    }
}

impl HttpInvoker {
    /// Create an invoker. `proxy_url`, when given and valid, enables the
    /// proxied client; an unparsable proxy URL is logged and ignored.
    pub fn new(proxy_url: Option<&str>) -> Self {
        let direct = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        let proxied = proxy_url.and_then(|url| match reqwest::Proxy::all(url) {
            Ok(proxy) => match reqwest::Client::builder().proxy(proxy).build() {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(proxy = url, error = %e, "failed to build proxied client");
                    None
                }
            },
            Err(e) => {
                warn!(proxy = url, error = %e, "invalid proxy URL, ignoring");
                None
            }
        });

        HttpInvoker {
            direct,
            proxied,
            api_base_override: None,
        }
    }

    /// Route every provider through one base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_override = Some(base.into());
        self
    }

    /// Build the full chat completions URL for a provider.
    fn completions_url(&self, spec_base: &str) -> String {
        let base = self
            .api_base_override
            .as_deref()
            .unwrap_or(spec_base)
            .trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Pick the client for this attempt. Proxy requested but unavailable
    /// falls back to the direct client.
    fn client(&self, use_proxy: bool) -> &reqwest::Client {
        if use_proxy {
            if let Some(ref proxied) = self.proxied {
                return proxied;
            }
        }
        &self.direct
    }
}

/// Map a reqwest transport error to the taxonomy.
fn classify_transport(e: &reqwest::Error) -> InvokeError {
    if e.is_timeout() {
        InvokeError::Timeout
    } else if e.is_connect() {
        InvokeError::Connection(e.to_string())
    } else {
        InvokeError::Other(e.to_string())
    }
}

/// Map a non-success HTTP status (+ body) to the taxonomy.
///
/// Some backends throttle with a 5xx and a "available in N seconds" notice
/// instead of a clean 429; that is still a rate limit.
fn classify_status(status: reqwest::StatusCode, body: &str) -> InvokeError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        InvokeError::RateLimited
    } else if status == reqwest::StatusCode::FORBIDDEN {
        InvokeError::Blocked(format!("{} — {}", status, body))
    } else if body.to_lowercase().contains("available in") {
        InvokeError::RateLimited
    } else {
        InvokeError::Other(format!("{} — {}", status, body))
    }
}

#[async_trait]
impl ProviderInvoker for HttpInvoker {
    async fn invoke(
        &self,
        provider: &str,
        turns: &[ConversationTurn],
        opts: &InvokeOptions,
    ) -> Result<String, InvokeError> {
        let spec = find_spec(provider)
            .ok_or_else(|| InvokeError::Other(format!("unknown provider: {provider}")))?;

        let url = self.completions_url(spec.api_base);
        let request_body = ChatCompletionRequest {
            model: spec.default_model.to_string(),
            messages: turns.to_vec(),
            temperature: None,
        };

        debug!(
            provider = provider,
            url = %url,
            turns = turns.len(),
            proxy = opts.use_proxy,
            "invoking provider"
        );

        let result = self
            .client(opts.use_proxy)
            .post(&url)
            .timeout(opts.timeout)
            .json(&request_body)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                let classified = classify_transport(&e);
                debug!(provider = provider, error = %e, kind = ?classified, "transport error");
                return Err(classified);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let classified = classify_status(status, &body);
            debug!(provider = provider, status = %status, kind = ?classified, "API error");
            return Err(classified);
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(completion) => Ok(completion.into_text()),
            Err(e) => {
                error!(provider = provider, error = %e, "failed to parse completion");
                Err(InvokeError::Other(format!("bad completion payload: {e}")))
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
