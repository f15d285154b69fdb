//! Completion orchestrator — the attempt state machine.
//!
//! One chat request = one walk over a bounded, rotating plan of providers.
//! The walk is strictly sequential: a single provider is in flight at any
//! moment, and the provider call is the loop's only suspension point.
//! Parallel dispatch would burn the free backends' goodwill for nothing —
//! rotation already explores the whole set.
//!
//! Failure policy per attempt:
//! - empty/whitespace reply → try the next provider
//! - timeout → try the next provider
//! - rate limit → remember the provider for the rest of this lap, no pause
//! - connection error → short fixed pause, then next provider
//! - blocked / anything else → log and move on
//!
//! The rate-limit memory is cleared every time a full lap over the provider
//! list completes: throttling on these shared endpoints is usually
//! transient, so each provider earns a fresh chance per cycle.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use coursechat_core::config::ChatSettings;
use coursechat_core::types::{ChatResult, ConversationTurn, HistoryPair};
use coursechat_core::utils::truncate_string;
use coursechat_providers::invoker::{InvokeError, InvokeOptions, ProviderInvoker};

use crate::formatter::format_response;
use crate::state::GatewayState;

// ─────────────────────────────────────────────
// Prompt context
// ─────────────────────────────────────────────

/// Expand stored history pairs plus the new message into the turn sequence
/// sent upstream. The full history goes through as-is — bounding its length
/// is the caller's responsibility, not the gateway's.
pub fn build_prompt_context(history: &[HistoryPair], message: &str) -> Vec<ConversationTurn> {
    let mut turns = Vec::with_capacity(history.len() * 2 + 1);
    for pair in history {
        if !pair.user_text.is_empty() {
            turns.push(ConversationTurn::user(&pair.user_text));
        }
        if !pair.assistant_text.is_empty() {
            turns.push(ConversationTurn::assistant(&pair.assistant_text));
        }
    }
    turns.push(ConversationTurn::user(message));
    turns
}

// ─────────────────────────────────────────────
// Attempt plan
// ─────────────────────────────────────────────

/// Build the ordered attempt sequence.
///
/// The ring is walked starting at `current` (position 0 if unknown), up to
/// `max_cycles` times. The first cycle takes every provider; later cycles
/// append a candidate only if it is missing from the plan's first `n`
/// entries. The result is truncated to `max_attempts`.
pub fn build_attempt_plan(
    providers: &[String],
    current: &str,
    max_cycles: usize,
    max_attempts: usize,
) -> Vec<String> {
    let n = providers.len();
    if n == 0 {
        return Vec::new();
    }

    let start = providers.iter().position(|p| p == current).unwrap_or(0);

    let mut plan: Vec<String> = Vec::new();
    for cycle in 0..max_cycles {
        for i in 0..n {
            let candidate = &providers[(start + i) % n];
            let in_first_lap = plan[..n.min(plan.len())].contains(candidate);
            if cycle == 0 || !in_first_lap {
                plan.push(candidate.clone());
            }
        }
    }

    plan.truncate(max_attempts);
    plan
}

// ─────────────────────────────────────────────
// The attempt walk
// ─────────────────────────────────────────────

/// Run one chat request against the provider ring.
///
/// `providers` is the caller's snapshot of the registry's full ordered list;
/// `state` supplies the rotation start and receives the winner.
pub async fn complete(
    invoker: &dyn ProviderInvoker,
    providers: &[String],
    state: &GatewayState,
    settings: &ChatSettings,
    message: &str,
    history: &[HistoryPair],
) -> ChatResult {
    let turns = build_prompt_context(history, message);
    let plan = build_attempt_plan(
        providers,
        &state.current_provider(),
        settings.max_cycles,
        settings.max_attempts,
    );

    info!(
        preview = %truncate_string(message, 50),
        turns = turns.len(),
        plan = plan.len(),
        "starting completion"
    );

    let n = providers.len();
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let retry_delay = Duration::from_millis(settings.connect_retry_delay_ms);
    let proxy_enabled = state.proxy_enabled();

    let mut rate_limited: HashSet<String> = HashSet::new();

    for (attempt, provider) in plan.iter().enumerate() {
        // A completed lap wipes the rate-limit memory — fresh chances.
        if attempt > 0 && attempt % n == 0 {
            debug!(attempt, "full cycle complete, clearing rate-limit set");
            rate_limited.clear();
        }

        if rate_limited.contains(provider) {
            debug!(provider = %provider, attempt = attempt + 1, "skipping, recently rate limited");
            continue;
        }

        debug!(provider = %provider, attempt = attempt + 1, total = plan.len(), "attempting");

        let opts = InvokeOptions {
            timeout,
            // Direct connections work better; the proxy only joins in once
            // the first few direct attempts have failed.
            use_proxy: proxy_enabled && attempt > 2,
        };

        let started = Instant::now();
        match invoker.invoke(provider, &turns, &opts).await {
            Ok(text) => {
                let raw = text.trim();
                if raw.is_empty() {
                    warn!(provider = %provider, "empty response");
                    continue;
                }

                let elapsed = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
                info!(provider = %provider, elapsed, attempt = attempt + 1, "success");

                state.record_success(provider);
                return ChatResult::success(
                    format_response(raw),
                    raw,
                    provider.clone(),
                    attempt + 1,
                    elapsed,
                );
            }
            Err(InvokeError::Timeout) => {
                warn!(provider = %provider, "timed out");
            }
            Err(InvokeError::RateLimited) => {
                warn!(provider = %provider, "rate limited, skipping for this cycle");
                rate_limited.insert(provider.clone());
                // No pause — move straight to the next provider.
            }
            Err(InvokeError::Connection(detail)) => {
                warn!(provider = %provider, detail = %detail, "connection error");
                // The one back-off in the system.
                tokio::time::sleep(retry_delay).await;
            }
            Err(InvokeError::Blocked(detail)) => {
                warn!(provider = %provider, detail = %detail, "blocked");
            }
            Err(InvokeError::Other(detail)) => {
                warn!(provider = %provider, detail = %detail, "attempt failed");
            }
        }
    }

    warn!(
        attempts = plan.len(),
        rate_limited = rate_limited.len(),
        "all providers unavailable"
    );
    ChatResult::all_unavailable(plan.len(), rate_limited.len())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coursechat_core::types::Role;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ── build_prompt_context ──

    #[test]
    fn test_context_message_only() {
        let turns = build_prompt_context(&[], "hello");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0], ConversationTurn::user("hello"));
    }

    #[test]
    fn test_context_expands_pairs_in_order() {
        let history = vec![
            HistoryPair::new("q1", "a1"),
            HistoryPair::new("q2", "a2"),
        ];
        let turns = build_prompt_context(&history, "q3");

        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].content, "q1");
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "a1");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[4].content, "q3");
        assert_eq!(turns[4].role, Role::User);
    }

    #[test]
    fn test_context_skips_empty_sides() {
        let history = vec![HistoryPair::new("q1", "")];
        let turns = build_prompt_context(&history, "q2");

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "q1");
        assert_eq!(turns[1].content, "q2");
    }

    #[test]
    fn test_context_no_truncation() {
        let history: Vec<HistoryPair> = (0..500)
            .map(|i| HistoryPair::new(format!("q{i}"), "a".repeat(10_000)))
            .collect();
        let turns = build_prompt_context(&history, "final");

        // Everything passes through, however long.
        assert_eq!(turns.len(), 1001);
    }

    // ── build_attempt_plan ──

    #[test]
    fn test_plan_rotation_from_current() {
        let providers = names(&["a", "b", "c", "d"]);
        let plan = build_attempt_plan(&providers, "c", 3, 30);

        assert_eq!(&plan[..4], &names(&["c", "d", "a", "b"])[..]);
    }

    #[test]
    fn test_plan_unknown_current_starts_at_zero() {
        let providers = names(&["a", "b", "c"]);
        let plan = build_attempt_plan(&providers, "nope", 3, 30);

        assert_eq!(&plan[..3], &names(&["a", "b", "c"])[..]);
    }

    #[test]
    fn test_plan_never_exceeds_cap() {
        let providers: Vec<String> = (0..40).map(|i| format!("p{i}")).collect();
        let plan = build_attempt_plan(&providers, "p0", 3, 30);

        assert_eq!(plan.len(), 30);
    }

    #[test]
    fn test_plan_bounded_by_cycles() {
        let providers = names(&["a", "b"]);
        let plan = build_attempt_plan(&providers, "a", 3, 30);

        assert!(plan.len() <= 2 * 3);
        for name in &providers {
            assert!(plan.iter().filter(|p| *p == name).count() <= 3);
        }
    }

    #[test]
    fn test_plan_is_single_rotation_when_first_lap_covers_everything() {
        // The first lap visits every ring position, so the dedup condition
        // leaves later cycles empty and the plan is one full rotation.
        let providers = names(&["a", "b", "c"]);
        let plan = build_attempt_plan(&providers, "b", 3, 30);
        assert_eq!(plan, names(&["b", "c", "a"]));

        let dup = names(&["a", "a", "b"]);
        let plan = build_attempt_plan(&dup, "a", 3, 30);
        assert_eq!(plan, names(&["a", "a", "b"]));
    }

    #[test]
    fn test_plan_empty_providers() {
        let plan = build_attempt_plan(&[], "a", 3, 30);
        assert!(plan.is_empty());
    }

    // ── complete: a scripted fake invoker ──

    struct ScriptedInvoker {
        script: Mutex<VecDeque<Result<String, InvokeError>>>,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<Result<String, InvokeError>>) -> Self {
            ScriptedInvoker {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            provider: &str,
            _turns: &[ConversationTurn],
            opts: &InvokeOptions,
        ) -> Result<String, InvokeError> {
            self.calls
                .lock()
                .unwrap()
                .push((provider.to_string(), opts.use_proxy));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(InvokeError::Other("script exhausted".into())))
        }
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            connect_retry_delay_ms: 1,
            ..ChatSettings::default()
        }
    }

    #[tokio::test]
    async fn test_third_provider_wins_after_empty_responses() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(String::new()),
            Ok("   ".to_string()),
            Ok("Hi there".to_string()),
        ]);
        let providers = names(&["a", "b", "c", "d"]);
        let state = GatewayState::new("a", false);

        let result = complete(&invoker, &providers, &state, &settings(), "hello", &[]).await;

        assert!(result.success);
        assert_eq!(result.provider_used.as_deref(), Some("c"));
        assert_eq!(result.attempt_count, 3);
        assert_eq!(result.response_text, "Hi there");
        assert!(result.elapsed_seconds.is_some());
        // The winner becomes the next rotation's starting point.
        assert_eq!(state.current_provider(), "c");
        assert_eq!(state.success_counts().get("c"), Some(&1));
    }

    #[tokio::test]
    async fn test_all_rate_limited_exhausts_plan() {
        let providers = names(&["a", "b", "c"]);
        let invoker =
            ScriptedInvoker::new(vec![Err(InvokeError::RateLimited); 9]);
        let state = GatewayState::new("a", false);

        let result = complete(&invoker, &providers, &state, &settings(), "hello", &[]).await;

        assert!(!result.success);
        assert_eq!(
            result.error_kind,
            Some(coursechat_core::types::ErrorKind::AllProvidersUnavailable)
        );
        // Every plan entry was walked.
        assert_eq!(result.attempt_count, 3);
        assert_eq!(result.rate_limited_count, 3);
        assert_eq!(state.current_provider(), "a");
    }

    #[tokio::test]
    async fn test_rotation_starts_at_current_provider() {
        let invoker = ScriptedInvoker::new(vec![Ok("answer".to_string())]);
        let providers = names(&["a", "b", "c", "d"]);
        let state = GatewayState::new("c", false);

        let result = complete(&invoker, &providers, &state, &settings(), "hi", &[]).await;

        assert!(result.success);
        assert_eq!(invoker.calls()[0].0, "c");
    }

    #[tokio::test]
    async fn test_mixed_failures_keep_rotating() {
        let invoker = ScriptedInvoker::new(vec![
            Err(InvokeError::Timeout),
            Err(InvokeError::Connection("refused".into())),
            Err(InvokeError::Blocked("403".into())),
            Ok("finally".to_string()),
        ]);
        let providers = names(&["a", "b", "c", "d"]);
        let state = GatewayState::new("a", false);

        let result = complete(&invoker, &providers, &state, &settings(), "hi", &[]).await;

        assert!(result.success);
        assert_eq!(result.provider_used.as_deref(), Some("d"));
        assert_eq!(result.attempt_count, 4);
    }

    #[tokio::test]
    async fn test_proxy_joins_after_third_attempt() {
        let invoker = ScriptedInvoker::new(vec![
            Err(InvokeError::Other("e".into())),
            Err(InvokeError::Other("e".into())),
            Err(InvokeError::Other("e".into())),
            Err(InvokeError::Other("e".into())),
            Ok("ok".to_string()),
        ]);
        let providers = names(&["a", "b", "c", "d", "e"]);
        let state = GatewayState::new("a", true);

        let result = complete(&invoker, &providers, &state, &settings(), "hi", &[]).await;

        assert!(result.success);
        let proxy_flags: Vec<bool> = invoker.calls().iter().map(|(_, p)| *p).collect();
        assert_eq!(proxy_flags, vec![false, false, false, true, true]);
    }

    #[tokio::test]
    async fn test_proxy_never_used_when_disabled() {
        let invoker = ScriptedInvoker::new(vec![
            Err(InvokeError::Other("e".into())),
            Err(InvokeError::Other("e".into())),
            Err(InvokeError::Other("e".into())),
            Ok("ok".to_string()),
        ]);
        let providers = names(&["a", "b", "c", "d"]);
        let state = GatewayState::new("a", false);

        complete(&invoker, &providers, &state, &settings(), "hi", &[]).await;

        assert!(invoker.calls().iter().all(|(_, p)| !p));
    }

    #[tokio::test]
    async fn test_empty_provider_list() {
        let invoker = ScriptedInvoker::new(vec![]);
        let state = GatewayState::new("a", false);

        let result = complete(&invoker, &[], &state, &settings(), "hi", &[]).await;

        assert!(!result.success);
        assert_eq!(result.attempt_count, 0);
        assert!(invoker.calls().is_empty());
    }

    #[tokio::test]
    async fn test_success_response_is_formatted() {
        let invoker = ScriptedInvoker::new(vec![Ok("Result: DONE\n\n\n\nbye".to_string())]);
        let providers = names(&["a"]);
        let state = GatewayState::new("a", false);

        let result = complete(&invoker, &providers, &state, &settings(), "hi", &[]).await;

        assert!(result.success);
        assert_eq!(result.raw_text.as_deref(), Some("Result: DONE\n\n\n\nbye"));
        assert_eq!(result.response_text, "**Result:**\n**DONE**\n\nbye");
    }

    #[tokio::test]
    async fn test_history_reaches_invoker() {
        struct CapturingInvoker {
            seen: Mutex<Vec<ConversationTurn>>,
        }

        #[async_trait]
        impl ProviderInvoker for CapturingInvoker {
            async fn invoke(
                &self,
                _provider: &str,
                turns: &[ConversationTurn],
                _opts: &InvokeOptions,
            ) -> Result<String, InvokeError> {
                *self.seen.lock().unwrap() = turns.to_vec();
                Ok("ok".to_string())
            }
        }

        let invoker = CapturingInvoker {
            seen: Mutex::new(Vec::new()),
        };
        let providers = names(&["a"]);
        let state = GatewayState::new("a", false);
        let history = vec![HistoryPair::new("earlier question", "earlier answer")];

        complete(&invoker, &providers, &state, &settings(), "now", &history).await;

        let seen = invoker.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].content, "earlier question");
        assert_eq!(seen[2].content, "now");
    }
}
