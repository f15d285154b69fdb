//! Provider registry — speed-tiered classification of the free chat backends.
//!
//! Each [`ProviderSpec`] describes one upstream: its endpoint, default model,
//! and which speed tier it was measured into. The tiers drive rotation order:
//! fast providers are tried first, slow ones are the reserve. A separate
//! blocked list documents endpoints that exist but cannot be dispatched
//! (Cloudflare walls, mandatory API keys) — introspection only.
//!
//! No network or I/O happens in this module.

use rand::seq::SliceRandom;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one backend
// ─────────────────────────────────────────────

/// Latency class of a provider, from measured response times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedTier {
    /// Under ~3 seconds.
    Fast,
    /// 3–6 seconds.
    Medium,
    /// Over 6 seconds, but answers.
    Slow,
}

impl SpeedTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedTier::Fast => "fast",
            SpeedTier::Medium => "medium",
            SpeedTier::Slow => "slow",
        }
    }
}

/// Static specification describing one free completion backend.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"Chatai"`).
    pub name: &'static str,
    /// Measured latency class.
    pub tier: SpeedTier,
    /// API base URL; requests go to `<api_base>/chat/completions`.
    pub api_base: &'static str,
    /// Model identifier the backend serves without authentication.
    pub default_model: &'static str,
    /// Short characterization, shown in status output.
    pub note: &'static str,
}

/// A provider that is known but cannot be dispatched.
#[derive(Clone, Debug)]
pub struct BlockedProvider {
    pub name: &'static str,
    /// Why it is unusable.
    pub reason: &'static str,
}

// ─────────────────────────────────────────────
// The verified baseline (16 working, re-measured 2025-07)
// ─────────────────────────────────────────────

/// Fast tier — responded in under 3 seconds.
pub static RECOMMENDED_FAST: &[ProviderSpec] = &[
    ProviderSpec {
        name: "Chatai",
        tier: SpeedTier::Fast,
        api_base: "https://chatai.aritek.app/v1",
        default_model: "gpt-4o-mini",
        note: "0.78s, fastest of the set",
    },
    ProviderSpec {
        name: "AnyProvider",
        tier: SpeedTier::Fast,
        api_base: "https://api.anyprovider.net/v1",
        default_model: "gpt-4o-mini",
        note: "0.98s, aggregator",
    },
    ProviderSpec {
        name: "Blackbox",
        tier: SpeedTier::Fast,
        api_base: "https://www.blackbox.ai/api",
        default_model: "blackboxai",
        note: "2.14s, reliable for code",
    },
    ProviderSpec {
        name: "OpenAIFM",
        tier: SpeedTier::Fast,
        api_base: "https://www.openai.fm/api/v1",
        default_model: "gpt-4o-mini",
        note: "2.34s",
    },
    ProviderSpec {
        name: "Qwen_Qwen_2_5_Max",
        tier: SpeedTier::Fast,
        api_base: "https://chat.qwen.ai/api/v1",
        default_model: "qwen2.5-max",
        note: "2.46s",
    },
    ProviderSpec {
        name: "OIVSCodeSer0501",
        tier: SpeedTier::Fast,
        api_base: "https://oi-vscode-server-0501.onrender.com/v1",
        default_model: "gpt-4o-mini",
        note: "2.53s, stable",
    },
    ProviderSpec {
        name: "WeWordle",
        tier: SpeedTier::Fast,
        api_base: "https://wewordle.org/gptapi/v1",
        default_model: "gpt-4o-mini",
        note: "2.54s",
    },
    ProviderSpec {
        name: "CohereForAI_C4AI_Command",
        tier: SpeedTier::Fast,
        api_base: "https://cohereforai-c4ai-command.hf.space/api/v1",
        default_model: "command-r-plus",
        note: "2.58s, stable",
    },
];

/// Medium tier — 3 to 6 seconds.
pub static RECOMMENDED_MEDIUM: &[ProviderSpec] = &[
    ProviderSpec {
        name: "OIVSCodeSer2",
        tier: SpeedTier::Medium,
        api_base: "https://oi-vscode-server-2.onrender.com/v1",
        default_model: "gpt-4o-mini",
        note: "4.76s, stable",
    },
    ProviderSpec {
        name: "Free2GPT",
        tier: SpeedTier::Medium,
        api_base: "https://chat10.free2gpt.xyz/api/v1",
        default_model: "gemini-1.5-pro",
        note: "4.77s",
    },
    ProviderSpec {
        name: "Qwen_Qwen_2_5",
        tier: SpeedTier::Medium,
        api_base: "https://chat.qwen.ai/api/v1",
        default_model: "qwen2.5",
        note: "5.25s",
    },
    ProviderSpec {
        name: "Yqcloud",
        tier: SpeedTier::Medium,
        api_base: "https://api.binjie.fun/api/v1",
        default_model: "gpt-4o-mini",
        note: "5.64s",
    },
];

/// Slow tier — over 6 seconds, kept as reserve.
pub static RECOMMENDED_SLOW: &[ProviderSpec] = &[
    ProviderSpec {
        name: "ImageLabs",
        tier: SpeedTier::Slow,
        api_base: "https://editor.imagelabs.net/api/v1",
        default_model: "general",
        note: "8.27s, image-leaning",
    },
    ProviderSpec {
        name: "Qwen_Qwen_3",
        tier: SpeedTier::Slow,
        api_base: "https://chat.qwen.ai/api/v1",
        default_model: "qwen3-235b",
        note: "15.45s, strong but slow",
    },
    ProviderSpec {
        name: "LambdaChat",
        tier: SpeedTier::Slow,
        api_base: "https://lambda.chat/api/v1",
        default_model: "deepseek-r1",
        note: "16.67s, reasoning",
    },
    ProviderSpec {
        name: "BlackForestLabs_Flux1Dev",
        tier: SpeedTier::Slow,
        api_base: "https://blackforestlabs-flux-1-dev.hf.space/api/v1",
        default_model: "flux-1-dev",
        note: "23.02s, image-leaning",
    },
];

/// Known-but-unusable providers. Never dispatched; listed for introspection.
pub static BLOCKED: &[BlockedProvider] = &[
    BlockedProvider { name: "You", reason: "Cloudflare wall" },
    BlockedProvider { name: "HuggingChat", reason: "needs browser automation" },
    BlockedProvider { name: "DeepInfra", reason: "needs API key" },
    BlockedProvider { name: "OpenaiChat", reason: "needs session HAR" },
    BlockedProvider { name: "Groq", reason: "needs API key" },
    BlockedProvider { name: "MetaAI", reason: "not responding" },
    BlockedProvider { name: "Copilot", reason: "needs TLS impersonation" },
    BlockedProvider { name: "DeepSeek", reason: "needs API key" },
    BlockedProvider { name: "HuggingFace", reason: "needs API key" },
];

/// Find a provider spec by exact name, across all three tiers.
pub fn find_spec(name: &str) -> Option<&'static ProviderSpec> {
    RECOMMENDED_FAST
        .iter()
        .chain(RECOMMENDED_MEDIUM)
        .chain(RECOMMENDED_SLOW)
        .find(|spec| spec.name == name)
}

/// The fastest recommended provider — the rotation's home position.
pub fn fastest_recommended() -> &'static str {
    RECOMMENDED_FAST[0].name
}

// ─────────────────────────────────────────────
// ProviderRegistry — the mutable rotation order
// ─────────────────────────────────────────────

/// Ordered provider lists per tier. The lists start at the verified baseline
/// and can be shuffled (to diversify load across restarts) or reset back.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    fast: Vec<String>,
    medium: Vec<String>,
    slow: Vec<String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::recommended()
    }
}

impl ProviderRegistry {
    /// Build a registry with the baseline ordering.
    pub fn recommended() -> Self {
        ProviderRegistry {
            fast: RECOMMENDED_FAST.iter().map(|s| s.name.to_string()).collect(),
            medium: RECOMMENDED_MEDIUM.iter().map(|s| s.name.to_string()).collect(),
            slow: RECOMMENDED_SLOW.iter().map(|s| s.name.to_string()).collect(),
        }
    }

    /// All dispatchable providers: fast ⧺ medium ⧺ slow, deduplicated,
    /// first-seen order preserved. Pure function of the three lists.
    pub fn all_providers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut ordered = Vec::new();
        for name in self.fast.iter().chain(&self.medium).chain(&self.slow) {
            if seen.insert(name.as_str()) {
                ordered.push(name.clone());
            }
        }
        ordered
    }

    /// The primary rotation: fast ⧺ medium. Slow providers are reserve only.
    pub fn working_providers(&self) -> Vec<String> {
        self.fast.iter().chain(&self.medium).cloned().collect()
    }

    pub fn fast(&self) -> &[String] {
        &self.fast
    }

    pub fn medium(&self) -> &[String] {
        &self.medium
    }

    pub fn slow(&self) -> &[String] {
        &self.slow
    }

    /// Whether `name` is dispatchable from this registry.
    pub fn contains(&self, name: &str) -> bool {
        self.fast.iter().chain(&self.medium).chain(&self.slow).any(|n| n == name)
    }

    /// Restore the fast and medium lists to the verified baseline.
    /// The slow reserve keeps whatever order it has.
    pub fn reset_to_recommended(&mut self) {
        self.fast = RECOMMENDED_FAST.iter().map(|s| s.name.to_string()).collect();
        self.medium = RECOMMENDED_MEDIUM.iter().map(|s| s.name.to_string()).collect();
    }

    /// Randomly permute the fast and medium lists, independently.
    /// No ordering guarantee afterward.
    pub fn shuffle(&mut self) {
        let mut rng = rand::rng();
        self.fast.shuffle(&mut rng);
        self.medium.shuffle(&mut rng);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
