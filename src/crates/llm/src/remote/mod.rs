//! Remote generation providers.
//!
//! - **Claude** - Anthropic Messages API

pub mod claude;

pub use claude::ClaudeClient;
