//! Grounded chat orchestration.
//!
//! Assembles a conversation around normalized site content and asks the
//! language model, retrying transient failures with linear backoff. The
//! system turn is synthesized fresh per request and always placed first.

pub mod orchestrator;

pub use orchestrator::{
    ChatError, ChatOrchestrator, EMPTY_RESPONSE_PLACEHOLDER, HISTORY_LIMIT, RESPONSE_MAX_TOKENS,
};
