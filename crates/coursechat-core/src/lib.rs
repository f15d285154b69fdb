//! Coursechat core — shared types, configuration, and utilities.
//!
//! This crate contains:
//! - **types**: conversation turns, history pairs, the gateway result, and
//!   the chat-completions wire format
//! - **config**: typed config schema + JSON/env loader
//! - **utils**: path and string helpers

pub mod config;
pub mod types;
pub mod utils;

pub use config::{Config, ChatSettings, ProxyConfig};
pub use types::{ChatResult, ConversationTurn, ErrorKind, HistoryPair, Role};
