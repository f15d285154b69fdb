//! Core types for Coursechat — the conversation model and the gateway result.
//!
//! The gateway receives a prepared, ordered conversation (oldest turn first)
//! and returns a [`ChatResult`]. Storing history is the caller's job; nothing
//! here caps or trims it.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Who produced a conversation turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation, in the chat-completions wire format.
///
/// Serializes as `{"role": "user", "content": "..."}` — exactly what the
/// upstream backends expect, so the prompt context can be posted as-is.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        ConversationTurn {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        ConversationTurn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One stored exchange, as the caller keeps it: what the user sent and what
/// the assistant answered. The gateway expands pairs into alternating
/// [`ConversationTurn`]s; an empty side is skipped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPair {
    pub user_text: String,
    pub assistant_text: String,
}

impl HistoryPair {
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        HistoryPair {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Gateway result
// ─────────────────────────────────────────────

/// Why a chat request failed, when it did.
///
/// Per-attempt failures (timeouts, rate limits, dead endpoints) are never
/// surfaced individually — only exhausting the whole attempt plan is.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    AllProvidersUnavailable,
}

/// Fallback text returned when every provider in the plan failed.
pub const ALL_UNAVAILABLE_MESSAGE: &str =
    "Sorry, all AI providers are currently unavailable. Please try again in a moment.";

/// Outcome of one gateway call, consumed by the caller to build its own
/// wire response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    pub success: bool,
    /// Formatted response on success, apologetic fallback on failure.
    pub response_text: String,
    /// Unformatted provider output, kept for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
    /// Plan entries walked, including skipped ones.
    pub attempt_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Providers sitting in the rate-limited set when the call ended.
    pub rate_limited_count: usize,
}

impl ChatResult {
    /// Build a success result.
    pub fn success(
        response_text: impl Into<String>,
        raw_text: impl Into<String>,
        provider: impl Into<String>,
        attempt_count: usize,
        elapsed_seconds: f64,
    ) -> Self {
        ChatResult {
            success: true,
            response_text: response_text.into(),
            raw_text: Some(raw_text.into()),
            provider_used: Some(provider.into()),
            attempt_count,
            elapsed_seconds: Some(elapsed_seconds),
            error_kind: None,
            rate_limited_count: 0,
        }
    }

    /// Build the exhausted-plan failure result.
    pub fn all_unavailable(attempt_count: usize, rate_limited_count: usize) -> Self {
        ChatResult {
            success: false,
            response_text: ALL_UNAVAILABLE_MESSAGE.to_string(),
            raw_text: None,
            provider_used: None,
            attempt_count,
            elapsed_seconds: None,
            error_kind: Some(ErrorKind::AllProvidersUnavailable),
            rate_limited_count,
        }
    }
}

// ─────────────────────────────────────────────
// Wire types (OpenAI-compatible chat completions)
// ─────────────────────────────────────────────

/// Request body posted to a backend's `/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw chat completion response. Used internally for deserialization.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
}

/// The assistant message within a choice. Backends that return nothing
/// useful leave `content` null; the gateway treats that as an empty reply.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Extract the first choice's text, or an empty string when the backend
    /// returned no usable content.
    pub fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
