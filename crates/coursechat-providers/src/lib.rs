//! Provider layer for Coursechat — the free chat-completion backends.
//!
//! # Architecture
//!
//! - [`registry`] — speed-tiered specs for the 16 verified backends,
//!   the blocked list, and the mutable rotation order
//! - [`invoker::ProviderInvoker`] — the invocation trait the gateway
//!   dispatches through, with a tagged error taxonomy
//! - [`http_invoker::HttpInvoker`] — reqwest implementation against the
//!   backends' OpenAI-compatible endpoints

pub mod http_invoker;
pub mod invoker;
pub mod registry;

// Re-export main types for convenience
pub use http_invoker::HttpInvoker;
pub use invoker::{InvokeError, InvokeOptions, ProviderInvoker};
pub use registry::{
    fastest_recommended, find_spec, BlockedProvider, ProviderRegistry, ProviderSpec, SpeedTier,
    BLOCKED, RECOMMENDED_FAST, RECOMMENDED_MEDIUM, RECOMMENDED_SLOW,
};
